//! End-to-end pipeline scenarios over the in-memory store with mock
//! embedding and generation providers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ragline_core::{
    EmbeddingProvider, Error, GenerationOptions, GenerationProvider, Result, RetryConfig, TenantId,
    VectorStore,
};
use ragline_pipeline::{PipelineConfig, RagPipeline};
use ragline_store::MemoryVectorStore;

const DIM: usize = 3;

const NO_CONTEXT_ANSWER: &str = "No supporting information was found in the ingested documents.";

/// Folds a character histogram into a fixed-width vector. Deterministic, so
/// identical texts always embed identically.
fn embed_text(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    for ch in text.chars() {
        vector[(ch as usize) % dimension] += 1.0;
    }
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

struct StubEmbedder {
    dimension: usize,
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| embed_text(text, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Fails the first `failures` calls with a retryable error, then delegates.
struct FlakyEmbedder {
    failures: AtomicU32,
    inner: StubEmbedder,
}

impl FlakyEmbedder {
    fn new(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            inner: StubEmbedder { dimension: DIM },
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::DependencyUnavailable(
                "embedding endpoint unreachable".to_string(),
            ));
        }
        self.inner.embed(texts).await
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Sleeps long enough to trip the pipeline's call timeout.
struct SlowEmbedder {
    delay: Duration,
    inner: StubEmbedder,
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(texts).await
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Canned generator that records every prompt it receives.
struct StubGenerator {
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for StubGenerator {
    async fn complete(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("Context:\n\n") {
            Ok(NO_CONTEXT_ANSWER.to_string())
        } else {
            Ok("Answer derived from the supplied context.".to_string())
        }
    }
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        },
        call_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    }
}

type TestPipeline<E> = RagPipeline<E, StubGenerator, MemoryVectorStore>;

fn pipeline_with<E: EmbeddingProvider>(
    embedder: Arc<E>,
    config: PipelineConfig,
) -> (TestPipeline<E>, Arc<StubGenerator>, Arc<MemoryVectorStore>) {
    let generator = Arc::new(StubGenerator::new());
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = RagPipeline::with_config(embedder, generator.clone(), store.clone(), config);
    (pipeline, generator, store)
}

fn sample_text(len: usize) -> String {
    "HIPAA is the Health Insurance Portability and Accountability Act. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

#[tokio::test]
async fn ingest_then_ask_returns_tenant_scoped_sources() {
    let (pipeline, generator, _) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();

    // 1200 chars at size 500 / overlap 100 gives windows at 0, 400, 800.
    let result = pipeline
        .ingest(&tenant, "hipaa.pdf", &sample_text(1200))
        .await
        .unwrap();
    assert_eq!(result.chunk_count, 3);

    let answer = pipeline
        .ask_with_top_k(&tenant, "What is HIPAA?", 2)
        .await
        .unwrap();
    assert_eq!(answer.sources, vec!["hipaa.pdf", "hipaa.pdf"]);
    assert_eq!(answer.metadata.chunks_retrieved, 2);
    let nearest = answer.metadata.nearest_distance.unwrap();
    let farthest = answer.metadata.farthest_distance.unwrap();
    assert!(nearest <= farthest);
    assert!(answer.confidence > 0.0 && answer.confidence <= 1.0);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Source: hipaa.pdf"));
    assert!(prompts[0].contains("What is HIPAA?"));
}

#[tokio::test]
async fn ask_against_empty_tenant_still_answers() {
    let (pipeline, generator, _) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let tenant = TenantId::from("empty");
    pipeline.register_tenant(&tenant).await.unwrap();

    let answer = pipeline.ask(&tenant, "Anything at all?").await.unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(answer.confidence, 0.0);
    assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
    assert_eq!(answer.metadata.chunks_retrieved, 0);
    // The generator was still invoked, with an empty context section.
    assert_eq!(generator.prompts().len(), 1);
}

#[tokio::test]
async fn identical_documents_never_cross_tenants() {
    let (pipeline, _, store) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let tenant_a = TenantId::from("a");
    let tenant_b = TenantId::from("b");
    pipeline.register_tenant(&tenant_a).await.unwrap();
    pipeline.register_tenant(&tenant_b).await.unwrap();

    let text = sample_text(1200);
    pipeline.ingest(&tenant_a, "shared.txt", &text).await.unwrap();
    pipeline.ingest(&tenant_b, "shared.txt", &text).await.unwrap();

    // Vectors are numerically identical across tenants; retrieval under A
    // must still only surface A's chunks.
    let probe = embed_text(&text[..500.min(text.len())], DIM);
    let from_a = store.query(&tenant_a, &probe, 50).await.unwrap();
    assert_eq!(from_a.len(), 3);
    for chunk in &from_a {
        assert_eq!(chunk.record.tenant_id, tenant_a);
    }

    let answer = pipeline
        .ask_with_top_k(&tenant_a, "What does the shared document say?", 50)
        .await
        .unwrap();
    assert_eq!(answer.sources.len(), 3);
}

#[tokio::test]
async fn failed_embedding_leaves_no_queryable_chunks() {
    let (pipeline, _, store) = pipeline_with(Arc::new(FlakyEmbedder::new(u32::MAX)), fast_config());
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();

    let err = pipeline
        .ingest(&tenant, "doc.txt", &sample_text(600))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DependencyUnavailable(_)));

    // Neither chunks nor the document record survive the failure.
    let probe = vec![0.0; DIM];
    assert!(store.query(&tenant, &probe, 10).await.unwrap().is_empty());

    // The whole ingestion retries cleanly as a unit.
    let healthy = RagPipeline::with_config(
        Arc::new(StubEmbedder { dimension: DIM }),
        Arc::new(StubGenerator::new()),
        store.clone(),
        fast_config(),
    );
    let result = healthy
        .ingest(&tenant, "doc.txt", &sample_text(600))
        .await
        .unwrap();
    assert_eq!(result.chunk_count, 2);
}

#[tokio::test]
async fn transient_embedding_failure_is_retried() {
    let (pipeline, _, _) = pipeline_with(Arc::new(FlakyEmbedder::new(1)), fast_config());
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();

    let result = pipeline
        .ingest(&tenant, "doc.txt", &sample_text(600))
        .await
        .unwrap();
    assert_eq!(result.chunk_count, 2);
}

#[tokio::test]
async fn provider_timeout_surfaces_as_dependency_unavailable() {
    let config = PipelineConfig {
        call_timeout: Duration::from_millis(20),
        retry: RetryConfig {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
        },
        ..PipelineConfig::default()
    };
    let embedder = Arc::new(SlowEmbedder {
        delay: Duration::from_millis(500),
        inner: StubEmbedder { dimension: DIM },
    });
    let (pipeline, _, _) = pipeline_with(embedder, config);
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();

    let err = pipeline
        .ingest(&tenant, "doc.txt", &sample_text(600))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DependencyUnavailable(_)));
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let (pipeline, generator, _) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();

    let err = pipeline.ask(&tenant, "   ").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn ingest_for_unknown_tenant_is_not_found() {
    let (pipeline, _, _) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let err = pipeline
        .ingest(&TenantId::from("ghost"), "doc.txt", "some text")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn empty_document_is_rejected_before_any_storage() {
    let (pipeline, _, store) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();

    let err = pipeline.ingest(&tenant, "doc.txt", "").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let probe = vec![0.0; DIM];
    assert!(store.query(&tenant, &probe, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_tenant_queries_come_back_empty() {
    let (pipeline, _, _) =
        pipeline_with(Arc::new(StubEmbedder { dimension: DIM }), fast_config());
    let tenant = TenantId::from(7);
    pipeline.register_tenant(&tenant).await.unwrap();
    pipeline
        .ingest(&tenant, "doc.txt", &sample_text(600))
        .await
        .unwrap();

    pipeline.delete_tenant(&tenant).await.unwrap();
    let answer = pipeline.ask(&tenant, "What remains?").await.unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(answer.answer, NO_CONTEXT_ANSWER);

    // Idempotent, including for tenants that never existed.
    pipeline.delete_tenant(&tenant).await.unwrap();
    pipeline
        .delete_tenant(&TenantId::from("never"))
        .await
        .unwrap();
}
