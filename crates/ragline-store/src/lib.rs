//! Tenant-partitioned vector storage for ragline
//!
//! This crate provides `MemoryVectorStore`, an exact-scan L2 store with
//! strict tenant isolation and optional JSON snapshot persistence.

mod memory;
mod snapshot;

pub use memory::MemoryVectorStore;

// Re-export core types for convenience
pub use ragline_core::{ChunkMetadata, ChunkRecord, Error, Result, ScoredChunk, VectorStore};
