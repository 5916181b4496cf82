//! LIFO stack of commit handles, used for undo.

use crate::storage::{ancestry, CommitGraph, CommitHandle, StorageError, StorageResult};

/// Last-in first-out stack of non-owning commit handles.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    frames: Vec<CommitHandle>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: CommitHandle) {
        self.frames.push(handle);
    }

    /// remove the top entry; `Underflow` when empty
    pub fn pop(&mut self) -> StorageResult<CommitHandle> {
        self.frames.pop().ok_or(StorageError::Underflow)
    }

    /// the top entry, without removing it
    pub fn peek(&self) -> StorageResult<CommitHandle> {
        self.frames.last().copied().ok_or(StorageError::Underflow)
    }

    /// The entry just below the top, without removing anything.
    ///
    /// This is the state an undo returns to. A stack with fewer than two
    /// entries has nothing to go back to and reports `Underflow`.
    pub fn peek_second(&self) -> StorageResult<CommitHandle> {
        self.frames
            .len()
            .checked_sub(2)
            .map(|i| self.frames[i])
            .ok_or(StorageError::Underflow)
    }

    /// Push every node of the breadth-first walk from `start`.
    ///
    /// `start` is pushed first, so the oldest ancestor ends up on top.
    /// Returns the number of frames pushed.
    pub fn push_lineage(&mut self, graph: &CommitGraph, start: CommitHandle) -> StorageResult<usize> {
        let lineage = ancestry::breadth_first_collect(graph, start)?;
        let pushed = lineage.len();
        self.frames.extend(lineage);
        Ok(pushed)
    }

    /// drop frames whose commit no longer exists; returns how many went
    pub fn prune(&mut self, graph: &CommitGraph) -> usize {
        let before = self.frames.len();
        self.frames.retain(|h| graph.contains(*h));
        before - self.frames.len()
    }

    /// entries from top to bottom
    pub fn iter(&self) -> impl Iterator<Item = CommitHandle> + '_ {
        self.frames.iter().rev().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
