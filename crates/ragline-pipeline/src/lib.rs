//! Retrieval-augmented pipeline for ragline
//!
//! Composes chunking, embedding, tenant-scoped retrieval, prompt assembly,
//! and answer generation behind injected provider and store dependencies.

pub mod chunker;
mod pipeline;
mod prompt;
mod retriever;

pub use chunker::chunk;
pub use pipeline::{PipelineConfig, RagPipeline};
pub use prompt::PromptBuilder;
pub use retriever::Retriever;

// Re-export core types for convenience
pub use ragline_core::{
    EmbeddingProvider, Error, GenerationOptions, GenerationProvider, IngestResult, QueryResult,
    Result, ScoredChunk, TenantId, VectorStore,
};
