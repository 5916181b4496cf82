//! Merge analysis between two commits.
//!
//! Both sides are walked back to their common ancestor. Every blob a
//! visited commit references is compared with the version of the same blob
//! id recorded in the ancestor's snapshot: equal bytes merge cleanly,
//! different bytes are a conflict, and ids the ancestor never saw are
//! additions. Nothing here writes to the graph or the blob store.

use std::collections::HashSet;

use serde::Serialize;

use crate::storage::ancestry;
use crate::storage::blob::BlobStore;
use crate::storage::commit::CommitGraph;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, BlobRef, CommitHandle};

/// which input of the merge an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MergeSide {
    Ours,
    Theirs,
}

/// the verdict for one blob on one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlobOutcome {
    /// same bytes as the ancestor's version
    Merged(BlobId),
    /// bytes differ from the ancestor's version
    Conflict(BlobId),
    /// the ancestor has no version of this blob
    Added(BlobId),
}

impl BlobOutcome {
    pub fn blob_id(&self) -> BlobId {
        match self {
            Self::Merged(id) | Self::Conflict(id) | Self::Added(id) => *id,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// one per-blob verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeEntry {
    pub side: MergeSide,
    pub outcome: BlobOutcome,
    /// the revision this side carries
    pub revision: BlobRef,
    /// the ancestor's revision, if it had one
    pub base: Option<BlobRef>,
}

/// result of analysing a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    pub ours: CommitHandle,
    pub theirs: CommitHandle,
    pub ancestor: CommitHandle,
    pub entries: Vec<MergeEntry>,
}

impl MergeResult {
    /// True if no blob conflicts
    pub fn is_clean(&self) -> bool {
        !self.entries.iter().any(|e| e.outcome.is_conflict())
    }

    /// conflicting blob ids, each reported once, in entry order
    pub fn conflicts(&self) -> Vec<BlobId> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| e.outcome.is_conflict())
            .map(|e| e.outcome.blob_id())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// entries contributed by one side
    pub fn side(&self, side: MergeSide) -> impl Iterator<Item = &MergeEntry> {
        self.entries.iter().filter(move |e| e.side == side)
    }

    /// check if either side is already contained in the other
    pub fn is_fast_forward(&self) -> bool {
        self.ancestor == self.ours || self.ancestor == self.theirs
    }
}

/// Analyse merging `theirs` into `ours`.
///
/// Fails with `Unrelated` when the two commits share no ancestor.
pub fn merge(
    graph: &CommitGraph,
    blobs: &BlobStore,
    ours: CommitHandle,
    theirs: CommitHandle,
) -> StorageResult<MergeResult> {
    let ancestor = ancestry::common_ancestor(graph, ours, theirs)?
        .ok_or(StorageError::Unrelated { ours, theirs })?;

    let snapshot = ancestry::breadth_first_collect(graph, ancestor)?;

    let mut entries = Vec::new();
    for (side, tip) in [(MergeSide::Ours, ours), (MergeSide::Theirs, theirs)] {
        let mut seen = HashSet::new();

        // nearest commits come first, so the first reference to an id is
        // the version this side currently carries
        for handle in ancestry::commits_since(graph, tip, ancestor)? {
            for revision in graph.commit(handle)?.blob_refs.iter().copied() {
                if !seen.insert(revision.id) {
                    continue;
                }
                let base = version_at(graph, &snapshot, revision.id)?;
                let outcome = compare(blobs, revision, base)?;
                entries.push(MergeEntry {
                    side,
                    outcome,
                    revision,
                    base,
                });
            }
        }
    }

    let result = MergeResult {
        ours,
        theirs,
        ancestor,
        entries,
    };
    tracing::debug!(
        %ours,
        %theirs,
        %ancestor,
        entries = result.entries.len(),
        conflicts = result.conflicts().len(),
        "analysed merge"
    );
    Ok(result)
}

/// the revision of `id` pinned by the nearest commit of `snapshot`
fn version_at(
    graph: &CommitGraph,
    snapshot: &[CommitHandle],
    id: BlobId,
) -> StorageResult<Option<BlobRef>> {
    for handle in snapshot {
        if let Some(found) = graph.commit(*handle)?.blob_ref(id) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn compare(blobs: &BlobStore, revision: BlobRef, base: Option<BlobRef>) -> StorageResult<BlobOutcome> {
    let Some(base) = base else {
        return Ok(BlobOutcome::Added(revision.id));
    };
    if base == revision {
        return Ok(BlobOutcome::Merged(revision.id));
    }

    let current = blobs.get_revision(revision)?;
    let original = blobs.get_revision(base)?;
    if current.bytes == original.bytes {
        Ok(BlobOutcome::Merged(revision.id))
    } else {
        Ok(BlobOutcome::Conflict(revision.id))
    }
}
