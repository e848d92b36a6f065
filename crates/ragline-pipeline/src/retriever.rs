//! Query-time retrieval over the vector store

use std::sync::Arc;

use ragline_core::{Result, ScoredChunk, TenantId, VectorStore};

/// Thin wrapper issuing tenant-scoped nearest-neighbor queries.
///
/// Exists as a seam so retrieval policy (filtering, re-ranking) can evolve
/// without touching storage internals.
pub struct Retriever<S> {
    store: Arc<S>,
}

impl<S: VectorStore> Retriever<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Retrieve the `top_k` chunks nearest to `query_vector` for one tenant.
    pub async fn retrieve(
        &self,
        tenant_id: &TenantId,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        self.store.query(tenant_id, query_vector, top_k).await
    }
}
