//! In-memory tenant-partitioned vector store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use ragline_core::{
    ChunkMetadata, ChunkRecord, DocumentRecord, Error, Result, ScoredChunk, TenantId, VectorStore,
};

use crate::snapshot;

/// One stored chunk plus its insertion sequence number. The sequence is the
/// tie-break key for equal distances and preserves intra-document order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct StoredChunk {
    pub seq: u64,
    pub record: ChunkRecord,
}

/// Full store state. Chunks are partitioned by tenant so a query never even
/// scans another tenant's data.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct StoreState {
    pub tenants: Vec<TenantId>,
    pub documents: HashMap<Uuid, DocumentRecord>,
    pub chunks: HashMap<TenantId, Vec<StoredChunk>>,
    pub next_seq: u64,
}

/// Exact-scan vector store with strict tenant isolation.
///
/// Vectors are compared by Euclidean (L2) distance, matching the embedding
/// space they were ingested in. All state sits behind one `RwLock`:
/// queries share the read lock, while inserts and deletes take the write
/// lock, so a query never observes a half-applied batch or deletion.
///
/// With a snapshot path configured, every mutation runs on a copy of the
/// state and commits only after the snapshot is atomically replaced on
/// disk; a failed persist leaves both memory and disk untouched.
#[derive(Debug)]
pub struct MemoryVectorStore {
    dimension: usize,
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl MemoryVectorStore {
    /// Create an empty in-memory store for vectors of the given width.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(StoreState::default()),
            path: None,
        }
    }

    /// Open a snapshot-backed store, loading existing state from `path` if
    /// present. Fails if the snapshot was written with a different vector
    /// dimensionality.
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match snapshot::read(&path)? {
            Some(snap) => {
                if snap.dimension != dimension {
                    return Err(Error::Configuration(format!(
                        "snapshot at {} holds {}-dimensional vectors, store configured for {}",
                        path.display(),
                        snap.dimension,
                        dimension
                    )));
                }
                snap.state
            }
            None => StoreState::default(),
        };
        Ok(Self {
            dimension,
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    /// Run a mutation against a copy of the state and commit it only after
    /// the snapshot (if any) has been persisted.
    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> Result<R>) -> Result<R> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| Error::Storage(format!("lock error: {e}")))?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if let Some(path) = &self.path {
            snapshot::write(path, self.dimension, &next)?;
        }
        *guard = next;
        Ok(out)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Euclidean distance between two equal-length vectors.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn register_tenant(&self, tenant_id: &TenantId) -> Result<()> {
        self.mutate(|state| {
            if !state.tenants.contains(tenant_id) {
                state.tenants.push(tenant_id.clone());
            }
            Ok(())
        })
    }

    async fn create_document(
        &self,
        tenant_id: &TenantId,
        source_name: &str,
    ) -> Result<DocumentRecord> {
        self.mutate(|state| {
            if !state.tenants.contains(tenant_id) {
                return Err(Error::NotFound(format!("tenant {tenant_id}")));
            }
            let record = DocumentRecord {
                doc_id: Uuid::new_v4(),
                tenant_id: tenant_id.clone(),
                source_name: source_name.to_string(),
                ingested_at: Utc::now(),
            };
            state.documents.insert(record.doc_id, record.clone());
            Ok(record)
        })
    }

    async fn insert_chunks(
        &self,
        doc_id: Uuid,
        tenant_id: &TenantId,
        vectors: Vec<Vec<f32>>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<()> {
        if vectors.len() != metadatas.len() {
            return Err(Error::Validation(format!(
                "{} vectors paired with {} metadata entries",
                vectors.len(),
                metadatas.len()
            )));
        }
        for vector in &vectors {
            self.check_dimension(vector)?;
        }
        let count = vectors.len();
        self.mutate(|state| {
            let doc = state
                .documents
                .get(&doc_id)
                .ok_or_else(|| Error::NotFound(format!("document {doc_id}")))?;
            if &doc.tenant_id != tenant_id {
                return Err(Error::Validation(format!(
                    "document {doc_id} does not belong to tenant {tenant_id}"
                )));
            }
            let chunks = state.chunks.entry(tenant_id.clone()).or_default();
            for (vector, metadata) in vectors.into_iter().zip(metadatas) {
                let seq = state.next_seq;
                state.next_seq += 1;
                chunks.push(StoredChunk {
                    seq,
                    record: ChunkRecord {
                        chunk_id: Uuid::new_v4(),
                        doc_id,
                        tenant_id: tenant_id.clone(),
                        vector,
                        metadata,
                    },
                });
            }
            Ok(())
        })?;
        debug!(tenant = %tenant_id, %doc_id, chunks = count, "inserted chunk batch");
        Ok(())
    }

    async fn query(
        &self,
        tenant_id: &TenantId,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        self.check_dimension(query_vector)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let state = self
            .state
            .read()
            .map_err(|e| Error::Storage(format!("lock error: {e}")))?;
        let Some(chunks) = state.chunks.get(tenant_id) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<(f32, u64, &StoredChunk)> = chunks
            .iter()
            .map(|chunk| (l2_distance(query_vector, &chunk.record.vector), chunk.seq, chunk))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(top_k);
        Ok(scored
            .into_iter()
            .map(|(distance, _, chunk)| ScoredChunk {
                record: chunk.record.clone(),
                distance,
            })
            .collect())
    }

    async fn delete_document(&self, doc_id: Uuid) -> Result<()> {
        self.mutate(|state| {
            let Some(doc) = state.documents.remove(&doc_id) else {
                return Ok(());
            };
            if let Some(chunks) = state.chunks.get_mut(&doc.tenant_id) {
                chunks.retain(|chunk| chunk.record.doc_id != doc_id);
            }
            Ok(())
        })
    }

    async fn delete_tenant(&self, tenant_id: &TenantId) -> Result<()> {
        self.mutate(|state| {
            state.tenants.retain(|t| t != tenant_id);
            state.documents.retain(|_, doc| &doc.tenant_id != tenant_id);
            state.chunks.remove(tenant_id);
            Ok(())
        })?;
        debug!(tenant = %tenant_id, "deleted tenant data");
        Ok(())
    }
}
