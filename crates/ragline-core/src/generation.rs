//! Generation provider trait and options

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Result;

/// Options for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: None,
            stop_sequences: Vec::new(),
        }
    }
}

/// Trait for answer-generation services.
///
/// Implementations turn a fully assembled prompt into an answer string.
/// A failed call must surface as an error, never as fabricated output.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;
}
