//! OpenAI provider configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use ragline_core::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DIMENSION: usize = 1536;

/// Configuration for the OpenAI-compatible clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub completion_model: String,
    /// Fixed dimensionality of embedding vectors; must match the vector
    /// store's configured width.
    pub dimension: usize,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var("RAGLINE_OPENAI_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                Error::Configuration(
                    "RAGLINE_OPENAI_API_KEY or OPENAI_API_KEY environment variable not found"
                        .to_string(),
                )
            })?;

        let base_url =
            env::var("RAGLINE_OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let embedding_model = env::var("RAGLINE_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());
        let completion_model = env::var("RAGLINE_COMPLETION_MODEL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_MODEL.to_string());

        let dimension = match env::var("RAGLINE_EMBEDDING_DIMENSION") {
            Ok(raw) => raw.parse().map_err(|_| {
                Error::Configuration(format!(
                    "RAGLINE_EMBEDDING_DIMENSION is not a valid positive integer: {raw}"
                ))
            })?,
            Err(_) => DEFAULT_DIMENSION,
        };

        Ok(Self {
            api_key,
            base_url,
            embedding_model,
            completion_model,
            dimension,
            timeout: Duration::from_secs(60),
        })
    }

    /// Create configuration with an explicit key and the stock defaults
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            timeout: Duration::from_secs(60),
        }
    }
}
