//! Blob storage for file content.
//!
//! Each blob id owns a chain of revisions. Writing to an id that already
//! exists appends a new revision instead of replacing the old bytes, so a
//! commit that pinned an earlier revision keeps seeing exactly what it saw.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, BlobRef};

/// immutable stored content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub id: BlobId,
    /// position in the id's chain, starting at 0
    pub revision: u32,
    pub bytes: Vec<u8>,
}

impl Blob {
    /// the reference a commit records for this blob
    pub fn blob_ref(&self) -> BlobRef {
        BlobRef::new(self.id, self.revision)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// content as UTF-8, if it is valid
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Append-only store of blob chains keyed by id.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    chains: HashMap<BlobId, Vec<Blob>>,
    revisions: usize,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// store `bytes` as the newest revision of `id`
    pub fn put(&mut self, id: BlobId, bytes: impl Into<Vec<u8>>) -> &Blob {
        let chain = self.chains.entry(id).or_default();
        let revision = chain.len() as u32;
        chain.push(Blob {
            id,
            revision,
            bytes: bytes.into(),
        });
        self.revisions += 1;

        tracing::debug!(blob = %id, revision, "stored blob revision");

        // the chain was pushed to just above
        &chain[chain.len() - 1]
    }

    /// newest revision stored under `id`
    pub fn get(&self, id: BlobId) -> StorageResult<&Blob> {
        self.chains
            .get(&id)
            .and_then(|chain| chain.last())
            .ok_or(StorageError::BlobNotFound(id))
    }

    /// the exact revision a commit pinned
    pub fn get_revision(&self, blob: BlobRef) -> StorageResult<&Blob> {
        self.chains
            .get(&blob.id)
            .and_then(|chain| chain.get(blob.revision as usize))
            .ok_or(StorageError::BlobNotFound(blob.id))
    }

    /// every revision of `id`, oldest first
    pub fn chain(&self, id: BlobId) -> &[Blob] {
        self.chains.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: BlobId) -> bool {
        self.chains.contains_key(&id)
    }

    /// number of distinct blob ids
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// number of stored revisions across all ids
    pub fn revision_count(&self) -> usize {
        self.revisions
    }

    /// metadata for every id, sorted by id
    pub fn metadata(&self) -> Vec<BlobMetadata> {
        let mut all: Vec<BlobMetadata> = self
            .chains
            .iter()
            .filter_map(|(id, chain)| {
                chain.last().map(|newest| BlobMetadata {
                    id: *id,
                    revisions: chain.len(),
                    size: newest.len(),
                })
            })
            .collect();
        all.sort_by_key(|m| m.id);
        all
    }
}

/// metadata about a blob chain without its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobMetadata {
    pub id: BlobId,
    pub revisions: usize,
    /// size of the newest revision in bytes
    pub size: usize,
}

/// read a source file completely
///
/// the file handle is released before this returns, on success and on error
pub fn read_source(path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to read source file");
        StorageError::Io(e)
    })
}
