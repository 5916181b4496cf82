//! FIFO queue of commit handles.

use std::collections::VecDeque;

use crate::storage::{CommitHandle, StorageError, StorageResult};

/// First-in first-out queue of non-owning commit handles.
#[derive(Debug, Clone, Default)]
pub struct HistoryQueue {
    frames: VecDeque<CommitHandle>,
}

impl HistoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, handle: CommitHandle) {
        self.frames.push_back(handle);
    }

    /// remove the oldest entry; `Underflow` when empty
    pub fn dequeue(&mut self) -> StorageResult<CommitHandle> {
        self.frames.pop_front().ok_or(StorageError::Underflow)
    }

    /// the oldest entry, without removing it
    pub fn front(&self) -> StorageResult<CommitHandle> {
        self.frames.front().copied().ok_or(StorageError::Underflow)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
