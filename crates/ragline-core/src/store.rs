//! Vector store trait and query result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{ChunkMetadata, ChunkRecord, DocumentRecord, TenantId};
use super::Result;

/// A chunk returned from a nearest-neighbor query, with its L2 distance to
/// the query vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    pub distance: f32,
}

/// Trait for tenant-partitioned vector stores.
///
/// All chunk access is scoped to a single tenant; no operation may return
/// data belonging to another tenant. The distance metric is Euclidean (L2),
/// matching the ingestion-time embedding space.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The fixed vector dimensionality this store was configured with.
    fn dimension(&self) -> usize;

    /// Register a tenant. Idempotent.
    async fn register_tenant(&self, tenant_id: &TenantId) -> Result<()>;

    /// Create a document record for a registered tenant.
    ///
    /// Fails with `Error::NotFound` if the tenant is unknown.
    async fn create_document(
        &self,
        tenant_id: &TenantId,
        source_name: &str,
    ) -> Result<DocumentRecord>;

    /// Persist one batch of chunks for a document, atomically.
    ///
    /// `vectors` and `metadatas` must have equal length
    /// (`Error::Validation`) and every vector must match the store's
    /// dimensionality (`Error::DimensionMismatch`). Either the whole batch
    /// lands or nothing does, so a failed ingestion can be retried as a
    /// unit.
    async fn insert_chunks(
        &self,
        doc_id: Uuid,
        tenant_id: &TenantId,
        vectors: Vec<Vec<f32>>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<()>;

    /// Return up to `top_k` chunks belonging to `tenant_id`, nearest first
    /// by L2 distance, ties broken by insertion order. `top_k == 0` and
    /// unknown tenants yield an empty result.
    async fn query(
        &self,
        tenant_id: &TenantId,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Remove a document and all of its chunks. Idempotent.
    async fn delete_document(&self, doc_id: Uuid) -> Result<()>;

    /// Remove every document and chunk owned by a tenant, atomically.
    /// Idempotent: deleting an absent tenant succeeds as a no-op.
    async fn delete_tenant(&self, tenant_id: &TenantId) -> Result<()>;
}
