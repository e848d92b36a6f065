//! OpenAI-compatible HTTP clients for embeddings and completions

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragline_core::{
    EmbeddingProvider, Error, GenerationOptions, GenerationProvider, Result,
};

use crate::config::OpenAiConfig;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Map a transport-level failure. Timeouts and connection loss are
/// transient and retryable; anything else is a hard provider error.
fn transport_error(err: reqwest::Error, what: &str) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::DependencyUnavailable(format!("{what} unreachable: {err}"))
    } else {
        Error::Provider(format!("{what} request failed: {err}"))
    }
}

/// Map a non-success HTTP status. Throttling and server errors are
/// transient; client errors are surfaced as provider rejections.
fn status_error(status: StatusCode, body: &str, what: &str) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::DependencyUnavailable(format!("{what} returned {status}: {body}"))
    } else {
        Error::Provider(format!("{what} request failed with status {status}: {body}"))
    }
}

fn build_client(config: &OpenAiConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Validate and order an embeddings payload: entries sorted back into input
/// order, count and dimensionality verified. The provider contract is
/// length-preserving; a shortfall is never papered over with placeholders.
fn collect_embeddings(
    mut data: Vec<EmbeddingData>,
    expected_count: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected_count {
        return Err(Error::Provider(format!(
            "embedding endpoint returned {} vectors for {} inputs",
            data.len(),
            expected_count
        )));
    }
    data.sort_by_key(|entry| entry.index);
    for entry in &data {
        if entry.embedding.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: entry.embedding.len(),
            });
        }
    }
    Ok(data.into_iter().map(|entry| entry.embedding).collect())
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbeddings {
    config: OpenAiConfig,
    client: Client,
    endpoint: String,
}

impl OpenAiEmbeddings {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = build_client(&config)?;
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "embedding endpoint"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "embedding endpoint"));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("invalid embedding response: {e}")))?;
        debug!(inputs = texts.len(), "embedded batch");
        collect_embeddings(parsed.data, texts.len(), self.config.dimension)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Completion client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompletions {
    config: OpenAiConfig,
    client: Client,
    endpoint: String,
}

impl OpenAiCompletions {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = build_client(&config)?;
        let endpoint = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompletions {
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.completion_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.stop_sequences.clone(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, "generation endpoint"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, "generation endpoint"));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("invalid generation response: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("generation response held no choices".to_string()))?;
        Ok(choice.message.content)
    }
}
