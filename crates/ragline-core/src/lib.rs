//! Core traits and types for ragline
//!
//! This crate defines the fundamental traits and types used across the
//! ragline pipeline: the error model, tenant-scoped record types, and the
//! capability-facing interfaces for embedding providers, generation
//! providers, and vector stores. Implementations live in sibling crates,
//! keeping the pipeline test-friendly and free of hidden singletons.

pub mod embedding;
pub mod error;
pub mod generation;
pub mod store;
pub mod types;

pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use generation::{GenerationOptions, GenerationProvider};
pub use store::{ScoredChunk, VectorStore};
pub use types::{
    ChunkMetadata, ChunkRecord, DocumentRecord, IngestResult, QueryMetadata, QueryResult,
    RetryConfig, TenantId,
};
