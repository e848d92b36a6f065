//! JSON snapshot persistence for the vector store
//!
//! The whole store state is serialized to one JSON file. Writes go through a
//! named temporary file in the target directory and rename into place, so a
//! crash mid-write can never corrupt the previous snapshot.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use ragline_core::{Error, Result};

use crate::memory::StoreState;

/// On-disk form of the store: the configured dimensionality plus full state.
#[derive(Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub dimension: usize,
    pub state: StoreState,
}

/// Serializable view used when writing, to avoid cloning the state.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    dimension: usize,
    state: &'a StoreState,
}

/// Load a snapshot, returning `None` when no file exists yet.
pub(crate) fn read(path: &Path) -> Result<Option<Snapshot>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(Error::Storage(format!(
                "failed to read snapshot {}: {err}",
                path.display()
            )));
        }
    };
    let snapshot = serde_json::from_slice(&bytes).map_err(|err| {
        Error::Storage(format!("corrupt snapshot {}: {err}", path.display()))
    })?;
    Ok(Some(snapshot))
}

/// Atomically replace the snapshot at `path` with the given state.
pub(crate) fn write(path: &Path, dimension: usize, state: &StoreState) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(|err| Error::Storage(format!("failed to create snapshot tempfile: {err}")))?;

    let body = serde_json::to_vec(&SnapshotRef { dimension, state })
        .map_err(|err| Error::Storage(format!("failed to encode snapshot: {err}")))?;
    tmp.write_all(&body)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|err| Error::Storage(format!("failed to write snapshot: {err}")))?;

    tmp.persist(path).map_err(|err| {
        Error::Storage(format!("failed to replace snapshot {}: {err}", path.display()))
    })?;
    Ok(())
}
