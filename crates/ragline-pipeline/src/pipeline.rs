//! Pipeline orchestration: ingestion and query handling

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use ragline_core::{
    ChunkMetadata, DocumentRecord, EmbeddingProvider, Error, GenerationOptions,
    GenerationProvider, IngestResult, QueryMetadata, QueryResult, Result, RetryConfig, TenantId,
    VectorStore,
};

use crate::chunker;
use crate::prompt::PromptBuilder;
use crate::retriever::Retriever;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub default_top_k: usize,
    /// Upper bound on each embedding/generation call.
    pub call_timeout: Duration,
    pub retry: RetryConfig,
    pub generation: GenerationOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            default_top_k: 5,
            call_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            generation: GenerationOptions::default(),
        }
    }
}

/// Drives ingestion (chunk → embed → store) and query handling
/// (embed → retrieve → prompt → generate).
///
/// All collaborators are injected at construction; the pipeline owns the
/// sequencing and the tenant-isolation contract but no hidden state.
pub struct RagPipeline<E, G, S> {
    embedder: Arc<E>,
    generator: Arc<G>,
    store: Arc<S>,
    retriever: Retriever<S>,
    prompt_builder: PromptBuilder,
    config: PipelineConfig,
}

impl<E, G, S> RagPipeline<E, G, S>
where
    E: EmbeddingProvider,
    G: GenerationProvider,
    S: VectorStore,
{
    pub fn new(embedder: Arc<E>, generator: Arc<G>, store: Arc<S>) -> Self {
        Self::with_config(embedder, generator, store, PipelineConfig::default())
    }

    pub fn with_config(
        embedder: Arc<E>,
        generator: Arc<G>,
        store: Arc<S>,
        config: PipelineConfig,
    ) -> Self {
        let retriever = Retriever::new(store.clone());
        Self {
            embedder,
            generator,
            store,
            retriever,
            prompt_builder: PromptBuilder::new(),
            config,
        }
    }

    /// Replace the default prompt template.
    pub fn with_prompt_builder(mut self, prompt_builder: PromptBuilder) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    /// Register a tenant with the underlying store. Idempotent.
    pub async fn register_tenant(&self, tenant_id: &TenantId) -> Result<()> {
        self.store.register_tenant(tenant_id).await
    }

    /// Ingest one document for a tenant: create the document record, chunk
    /// the text, embed all chunks in one batch, and insert them atomically.
    ///
    /// Any failure after the document record exists rolls the document back;
    /// a document is never left queryable with zero or partial chunks, so
    /// the whole call can be retried as a unit.
    pub async fn ingest(
        &self,
        tenant_id: &TenantId,
        source_name: &str,
        raw_text: &str,
    ) -> Result<IngestResult> {
        if source_name.trim().is_empty() {
            return Err(Error::Validation("source name is empty".to_string()));
        }
        if raw_text.is_empty() {
            return Err(Error::Validation(
                "document text is empty, nothing to ingest".to_string(),
            ));
        }

        let doc = self.store.create_document(tenant_id, source_name).await?;
        match self.embed_and_insert(&doc, raw_text).await {
            Ok(chunk_count) => {
                info!(
                    tenant = %tenant_id,
                    doc_id = %doc.doc_id,
                    source = source_name,
                    chunks = chunk_count,
                    "document ingested"
                );
                Ok(IngestResult {
                    doc_id: doc.doc_id,
                    source_name: source_name.to_string(),
                    chunk_count,
                })
            }
            Err(err) => {
                if let Err(cleanup) = self.store.delete_document(doc.doc_id).await {
                    warn!(doc_id = %doc.doc_id, error = %cleanup, "rollback of failed ingestion also failed");
                }
                Err(err)
            }
        }
    }

    async fn embed_and_insert(&self, doc: &DocumentRecord, raw_text: &str) -> Result<usize> {
        let texts = chunker::chunk(raw_text, self.config.chunk_size, self.config.chunk_overlap)?;
        debug!(doc_id = %doc.doc_id, chunks = texts.len(), "chunked document");

        let vectors = self
            .call_bounded("embedding service", || self.embedder.embed(&texts))
            .await?;
        if vectors.len() != texts.len() {
            return Err(Error::DependencyUnavailable(format!(
                "embedding service returned {} vectors for {} chunks",
                vectors.len(),
                texts.len()
            )));
        }

        let metadatas: Vec<ChunkMetadata> = texts
            .iter()
            .map(|text| ChunkMetadata {
                source: doc.source_name.clone(),
                text: text.clone(),
                ingested_at: doc.ingested_at,
            })
            .collect();
        self.store
            .insert_chunks(doc.doc_id, &doc.tenant_id, vectors, metadatas)
            .await?;
        Ok(texts.len())
    }

    /// Answer a question from the tenant's ingested documents, using the
    /// configured default `top_k`.
    pub async fn ask(&self, tenant_id: &TenantId, question: &str) -> Result<QueryResult> {
        self.ask_with_top_k(tenant_id, question, self.config.default_top_k)
            .await
    }

    /// Answer a question, retrieving up to `top_k` context chunks.
    ///
    /// An empty retrieval (unknown or empty tenant) is not an error: the
    /// generator is still invoked with an empty context section and is
    /// expected to indicate that no supporting information was found.
    pub async fn ask_with_top_k(
        &self,
        tenant_id: &TenantId,
        question: &str,
        top_k: usize,
    ) -> Result<QueryResult> {
        if question.trim().is_empty() {
            return Err(Error::Validation("question is empty".to_string()));
        }

        let query_texts = vec![question.to_string()];
        let mut embedded = self
            .call_bounded("embedding service", || self.embedder.embed(&query_texts))
            .await?;
        if embedded.len() != 1 {
            return Err(Error::DependencyUnavailable(format!(
                "embedding service returned {} vectors for one question",
                embedded.len()
            )));
        }
        let query_vector = embedded.remove(0);

        let retrieved = self
            .retriever
            .retrieve(tenant_id, &query_vector, top_k)
            .await?;
        debug!(tenant = %tenant_id, retrieved = retrieved.len(), "retrieved context chunks");

        let prompt = self.prompt_builder.build(question, &retrieved);
        let answer = self
            .call_bounded("generation service", || {
                self.generator.complete(&prompt, &self.config.generation)
            })
            .await?;

        // Provenance per retrieved chunk, nearest first, duplicates kept.
        let sources: Vec<String> = retrieved
            .iter()
            .map(|chunk| chunk.record.metadata.source.clone())
            .collect();
        let nearest = retrieved.first().map(|chunk| chunk.distance);
        let farthest = retrieved.last().map(|chunk| chunk.distance);
        let confidence = confidence_from_distance(nearest);

        info!(
            tenant = %tenant_id,
            retrieved = retrieved.len(),
            confidence,
            "query answered"
        );
        Ok(QueryResult {
            answer,
            sources,
            confidence,
            metadata: QueryMetadata {
                chunks_retrieved: retrieved.len(),
                nearest_distance: nearest,
                farthest_distance: farthest,
            },
        })
    }

    /// Remove every document and chunk owned by a tenant. Idempotent.
    pub async fn delete_tenant(&self, tenant_id: &TenantId) -> Result<()> {
        self.store.delete_tenant(tenant_id).await
    }

    /// Run a provider call under the configured timeout, retrying transient
    /// dependency failures with exponential backoff. Timeouts count as
    /// transient. All other errors surface immediately.
    async fn call_bounded<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let retry = &self.config.retry;
        let mut attempt = 1u32;
        loop {
            let outcome = match timeout(self.config.call_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(Error::DependencyUnavailable(format!(
                    "{what} call timed out after {:?}",
                    self.config.call_timeout
                ))),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < retry.max_attempts => {
                    warn!(attempt, error = %err, "{what} failed, retrying");
                    sleep(retry.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Confidence for a query result: `1 / (1 + d)` for the nearest retrieved
/// distance `d`, `0.0` when nothing was retrieved. Monotone decreasing in
/// distance and bounded to (0, 1].
fn confidence_from_distance(nearest: Option<f32>) -> f32 {
    match nearest {
        Some(distance) => 1.0 / (1.0 + distance.max(0.0)),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_monotone_in_distance() {
        let close = confidence_from_distance(Some(0.0));
        let near = confidence_from_distance(Some(0.5));
        let far = confidence_from_distance(Some(10.0));
        assert_eq!(close, 1.0);
        assert!(close > near && near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn empty_retrieval_has_zero_confidence() {
        assert_eq!(confidence_from_distance(None), 0.0);
    }
}
