//! OpenAI-compatible provider integrations for ragline
//!
//! This crate implements the `EmbeddingProvider` and `GenerationProvider`
//! traits against OpenAI-style HTTP endpoints.

mod client;
mod config;

pub use client::{OpenAiCompletions, OpenAiEmbeddings};
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use ragline_core::{EmbeddingProvider, Error, GenerationProvider, Result};
