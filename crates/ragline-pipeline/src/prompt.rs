//! Generation prompt assembly

use ragline_core::ScoredChunk;

const DEFAULT_TEMPLATE: &str = "You are an assistant answering questions from supplied reference material. \
Use only the following context to answer the user's question and cite the sources you used.\n\n\
Context:\n{context}\n\n\
Question: {question}\n\n\
If the context does not contain enough information, say so instead of guessing.";

const CHUNK_SEPARATOR: &str = "\n---\n";

/// Deterministically renders retrieved chunks plus the question into a
/// single generation prompt.
///
/// Only each chunk's source name and text reach the prompt; tenant ids and
/// any other metadata never leak into generated output.
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom instruction template. The template must contain the
    /// `{context}` and `{question}` placeholders.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Build the prompt. An empty chunk list produces a prompt with an
    /// empty context section; the generator is still expected to respond,
    /// indicating that no supporting information was found.
    pub fn build(&self, question: &str, chunks: &[ScoredChunk]) -> String {
        let context = chunks
            .iter()
            .map(|chunk| {
                format!(
                    "Source: {}\n{}",
                    chunk.record.metadata.source, chunk.record.metadata.text
                )
            })
            .collect::<Vec<_>>()
            .join(CHUNK_SEPARATOR);
        self.template
            .replace("{context}", &context)
            .replace("{question}", question)
    }
}
