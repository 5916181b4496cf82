//!  Branch table.
//!
//!  Branches are named, movable pointers into the commit graph. This module
//!  handles:
//! - Branch creation as a shallow clone of another branch's head
//! - The checked-out branch selector
//! - Linear head advancement
//!
//! The table has a fixed upper bound on the number of branches, taken from
//! the repository configuration.

use serde::Serialize;

use crate::storage::commit::CommitGraph;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BranchName, CommitHandle};

/// A named pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRef {
    pub name: BranchName,
    pub head: CommitHandle,
}

/// Bounded table of branches plus the checked-out selector.
#[derive(Debug, Clone)]
pub struct BranchTable {
    branches: Vec<BranchRef>,
    current: Option<BranchName>,
    capacity: usize,
}

impl BranchTable {
    /// Create an empty table holding at most `capacity` branches.
    pub fn new(capacity: usize) -> Self {
        Self {
            branches: Vec::new(),
            current: None,
            capacity,
        }
    }

    /// Add a branch pointing at `head`.
    pub fn insert(&mut self, name: BranchName, head: CommitHandle) -> StorageResult<&BranchRef> {
        self.check_insert(&name)?;

        tracing::info!(branch = %name, head = %head, "created branch");
        let index = self.branches.len();
        self.branches.push(BranchRef { name, head });
        Ok(&self.branches[index])
    }

    /// Check that `name` could be added right now.
    pub(crate) fn check_insert(&self, name: &BranchName) -> StorageResult<()> {
        if self.contains(name) {
            return Err(StorageError::DuplicateBranch(name.to_string()));
        }
        if self.branches.len() >= self.capacity {
            return Err(StorageError::CapacityExceeded {
                resource: "branch table",
                limit: self.capacity,
            });
        }
        Ok(())
    }

    /// Create `name` as a shallow clone of `from`: both share `from`'s head.
    pub fn create(&mut self, name: BranchName, from: &BranchName) -> StorageResult<&BranchRef> {
        let head = self.head(from)?;
        self.insert(name, head)
    }

    /// Select the checked-out branch.
    pub fn checkout(&mut self, name: &BranchName) -> StorageResult<()> {
        if !self.contains(name) {
            return Err(StorageError::BranchNotFound(name.to_string()));
        }
        tracing::info!(branch = %name, "checked out branch");
        self.current = Some(name.clone());
        Ok(())
    }

    /// Move `name` forward to `node`.
    ///
    /// Only legal when `node`'s primary parent is the branch's current head.
    pub fn advance(&mut self, graph: &CommitGraph, name: &BranchName, node: CommitHandle) -> StorageResult<()> {
        let head = self.head(name)?;
        if graph.get(node)?.parent() != Some(head) {
            tracing::warn!(branch = %name, %head, target = %node, "rejected non-linear advance");
            return Err(StorageError::NotFastForward {
                branch: name.to_string(),
                head,
                target: node,
            });
        }
        self.set_head(name, node)
    }

    /// Point `name` at `node` without any ancestry check.
    pub(crate) fn set_head(&mut self, name: &BranchName, node: CommitHandle) -> StorageResult<()> {
        let branch = self
            .branches
            .iter_mut()
            .find(|b| &b.name == name)
            .ok_or_else(|| StorageError::BranchNotFound(name.to_string()))?;
        tracing::debug!(branch = %name, from = %branch.head, to = %node, "moved branch head");
        branch.head = node;
        Ok(())
    }

    /// Remove a branch. The checked-out branch cannot be removed.
    pub fn delete(&mut self, name: &BranchName) -> StorageResult<BranchRef> {
        if self.current.as_ref() == Some(name) {
            return Err(StorageError::BranchCheckedOut(name.to_string()));
        }
        let index = self
            .branches
            .iter()
            .position(|b| &b.name == name)
            .ok_or_else(|| StorageError::BranchNotFound(name.to_string()))?;
        tracing::info!(branch = %name, "deleted branch");
        Ok(self.branches.remove(index))
    }

    pub fn get(&self, name: &BranchName) -> StorageResult<&BranchRef> {
        self.branches
            .iter()
            .find(|b| &b.name == name)
            .ok_or_else(|| StorageError::BranchNotFound(name.to_string()))
    }

    /// the head commit of `name`
    pub fn head(&self, name: &BranchName) -> StorageResult<CommitHandle> {
        self.get(name).map(|b| b.head)
    }

    pub fn contains(&self, name: &BranchName) -> bool {
        self.branches.iter().any(|b| &b.name == name)
    }

    /// the checked-out branch, if any
    pub fn current(&self) -> Option<&BranchRef> {
        let name = self.current.as_ref()?;
        self.branches.iter().find(|b| &b.name == name)
    }

    /// branches in creation order
    pub fn iter(&self) -> impl Iterator<Item = &BranchRef> {
        self.branches.iter()
    }

    /// branches whose head is `node`
    pub(crate) fn pointing_at(&self, node: CommitHandle) -> Vec<BranchName> {
        self.branches
            .iter()
            .filter(|b| b.head == node)
            .map(|b| b.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
