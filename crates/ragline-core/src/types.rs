//! Common record and result types used across the ragline system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Opaque tenant identifier, the isolation boundary for documents and
/// chunks. Accepts both string and integer-like ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for TenantId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A document registered for a tenant. Immutable once created; deleted only
/// together with its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: Uuid,
    pub tenant_id: TenantId,
    pub source_name: String,
    pub ingested_at: DateTime<Utc>,
}

/// Metadata carried by every chunk. `text` reconstructs the chunk content
/// verbatim; `source` is the only field allowed into generation prompts
/// besides the text itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub text: String,
    pub ingested_at: DateTime<Utc>,
}

/// One embedded passage. Append-only: never mutated, only bulk-deleted with
/// its parent document or tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: Uuid,
    pub doc_id: Uuid,
    pub tenant_id: TenantId,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub doc_id: Uuid,
    pub source_name: String,
    pub chunk_count: usize,
}

/// Outcome of a successful query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    /// Per-chunk provenance in retrieval order (nearest first); a source
    /// appearing in two retrieved chunks appears twice.
    pub sources: Vec<String>,
    /// Derived from retrieval distance as `1 / (1 + d_min)` where `d_min`
    /// is the L2 distance of the nearest retrieved chunk; `0.0` when
    /// nothing was retrieved. Monotone decreasing in distance.
    pub confidence: f32,
    pub metadata: QueryMetadata,
}

/// Retrieval detail attached to a query result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub chunks_retrieved: usize,
    pub nearest_distance: Option<f32>,
    pub farthest_distance: Option<f32>,
}

/// Configuration for retry behavior on transient dependency failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff delay before the given retry (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}
