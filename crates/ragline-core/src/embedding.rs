//! Embedding provider trait

use async_trait::async_trait;

use super::Result;

/// Trait for embedding services (e.g., OpenAI-compatible endpoints).
///
/// Implementations convert text into fixed-dimension vectors. The returned
/// sequence must be length-preserving and in the same order as the input;
/// every vector must have exactly `dimension()` components. Implementations
/// must never substitute placeholder vectors for a failed call.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in one call.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed dimensionality of every vector this provider produces.
    fn dimension(&self) -> usize;
}
