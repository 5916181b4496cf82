//!  Commit records and the commit graph.
//!
//!  The graph is an arena of [`CommitNode`]s addressed by [`CommitHandle`]s.
//!  Every structural reference (primary parent, additional parents, branch
//!  heads, history frames) is a handle, never an owning pointer:
//! - nodes are owned by the arena alone
//! - deleting a node empties its slot, so stale handles fail on lookup
//! - handles are never reused
//!
//! Nodes are also filed in chains keyed by [`CommitId`], which is what
//! repository-wide scans walk.

use std::collections::HashMap;

use chrono::Local;
use serde::Serialize;

use crate::storage::ancestry;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, BlobRef, CommitHandle, CommitId};

/// format used for commit timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// an immutable commit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub timestamp: String,
    /// pinned blob revisions, in the order they were committed
    pub blob_refs: Vec<BlobRef>,
}

impl Commit {
    /// create a commit stamped with the current local time
    pub fn new(
        id: CommitId,
        message: impl Into<String>,
        author: impl Into<String>,
        blob_refs: Vec<BlobRef>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            author: author.into(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            blob_refs,
        }
    }

    /// first line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }

    pub fn blob_ids(&self) -> impl Iterator<Item = BlobId> + '_ {
        self.blob_refs.iter().map(|r| r.id)
    }

    /// the revision of `id` this commit pinned, if it references it
    pub fn blob_ref(&self, id: BlobId) -> Option<BlobRef> {
        self.blob_refs.iter().copied().find(|r| r.id == id)
    }
}

/// whether a node has any parent edge yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unlinked,
    Linked,
}

/// a vertex of the commit graph
#[derive(Debug, Clone)]
pub struct CommitNode {
    commit: Commit,
    parent: Option<CommitHandle>,
    parent_list: Vec<CommitHandle>,
}

impl CommitNode {
    fn new(commit: Commit) -> Self {
        Self {
            commit,
            parent: None,
            parent_list: Vec::new(),
        }
    }

    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    /// primary parent, followed by linear history walks
    pub fn parent(&self) -> Option<CommitHandle> {
        self.parent
    }

    /// additional parents, in insertion order
    pub fn parent_list(&self) -> &[CommitHandle] {
        &self.parent_list
    }

    /// primary parent first, then the additional ones
    pub fn parents(&self) -> impl Iterator<Item = CommitHandle> + '_ {
        self.parent.into_iter().chain(self.parent_list.iter().copied())
    }

    pub fn has_parent(&self, handle: CommitHandle) -> bool {
        self.parent == Some(handle) || self.parent_list.contains(&handle)
    }

    pub fn state(&self) -> NodeState {
        if self.parent.is_some() {
            NodeState::Linked
        } else {
            NodeState::Unlinked
        }
    }

    /// check if this node has more than one parent
    pub fn is_merge(&self) -> bool {
        self.parent.is_some() && !self.parent_list.is_empty()
    }
}

/// Arena-backed commit DAG.
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    nodes: Vec<Option<CommitNode>>,
    chains: HashMap<CommitId, Vec<CommitHandle>>,
    live: usize,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// allocate an unlinked node for a new commit
    pub fn create_commit(
        &mut self,
        id: CommitId,
        message: impl Into<String>,
        author: impl Into<String>,
        blob_refs: Vec<BlobRef>,
    ) -> CommitHandle {
        self.insert(Commit::new(id, message, author, blob_refs))
    }

    /// allocate an unlinked node holding `commit`
    pub fn insert(&mut self, commit: Commit) -> CommitHandle {
        let handle = CommitHandle::new(self.nodes.len());
        self.chains.entry(commit.id).or_default().push(handle);
        tracing::debug!(commit = %handle, key = %commit.id, "created commit node");
        self.nodes.push(Some(CommitNode::new(commit)));
        self.live += 1;
        handle
    }

    /// Add `parent` as a parent of `child`.
    ///
    /// The first edge becomes the primary parent; later edges are appended
    /// to the parent list. Re-adding an existing edge changes nothing.
    /// Fails without touching the graph if the edge would close a cycle.
    pub fn link(&mut self, child: CommitHandle, parent: CommitHandle) -> StorageResult<()> {
        self.get(parent)?;
        if self.get(child)?.has_parent(parent) {
            return Ok(());
        }

        // parent must not already be reachable from child's descendants,
        // i.e. child must not be an ancestor (or self) of parent
        if ancestry::is_ancestor(self, child, parent)? {
            tracing::warn!(%child, %parent, "rejected link: would create a cycle");
            return Err(StorageError::Cycle { child, parent });
        }

        let node = self.get_mut(child)?;
        match node.parent {
            None => node.parent = Some(parent),
            Some(_) => node.parent_list.push(parent),
        }
        tracing::debug!(%child, %parent, "linked commit");
        Ok(())
    }

    /// live node for `handle`
    pub fn get(&self, handle: CommitHandle) -> StorageResult<&CommitNode> {
        self.nodes
            .get(handle.index())
            .and_then(Option::as_ref)
            .ok_or(StorageError::CommitNotFound(handle))
    }

    fn get_mut(&mut self, handle: CommitHandle) -> StorageResult<&mut CommitNode> {
        self.nodes
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .ok_or(StorageError::CommitNotFound(handle))
    }

    /// the commit record held by `handle`
    pub fn commit(&self, handle: CommitHandle) -> StorageResult<&Commit> {
        self.get(handle).map(CommitNode::commit)
    }

    pub fn contains(&self, handle: CommitHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// the chain of nodes filed under `id`, newest first
    pub fn lookup_bucket(&self, id: CommitId) -> Vec<CommitHandle> {
        self.chains
            .get(&id)
            .map(|chain| chain.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    /// every live node, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (CommitHandle, &CommitNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (CommitHandle::new(i), node)))
    }

    /// nodes that list `handle` as a parent
    pub fn children(&self, handle: CommitHandle) -> Vec<CommitHandle> {
        self.iter()
            .filter(|(_, node)| node.has_parent(handle))
            .map(|(h, _)| h)
            .collect()
    }

    /// Remove a node and release its commit.
    ///
    /// Children whose primary parent was the removed node are re-linked to
    /// its primary parent (or, for a removed root, promote their first
    /// additional parent). Additional-parent entries naming the node are
    /// dropped. Nothing is left pointing at the empty slot.
    pub fn delete(&mut self, handle: CommitHandle) -> StorageResult<Commit> {
        let removed = self
            .nodes
            .get_mut(handle.index())
            .and_then(Option::take)
            .ok_or(StorageError::CommitNotFound(handle))?;
        self.live -= 1;

        if let Some(chain) = self.chains.get_mut(&removed.commit.id) {
            chain.retain(|h| *h != handle);
            if chain.is_empty() {
                self.chains.remove(&removed.commit.id);
            }
        }

        for node in self.nodes.iter_mut().flatten() {
            node.parent_list.retain(|p| *p != handle);
            if node.parent == Some(handle) {
                node.parent = removed.parent;
                match node.parent {
                    Some(grandparent) => node.parent_list.retain(|p| *p != grandparent),
                    None if !node.parent_list.is_empty() => {
                        node.parent = Some(node.parent_list.remove(0));
                    }
                    None => {}
                }
            }
        }

        tracing::debug!(commit = %handle, "deleted commit node");
        Ok(removed.commit)
    }

    /// number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
