//! Storage layer error types
//!
//! Every failure the engine can report is a variant of [`StorageError`].
//! None of them is fatal: the caller decides whether to retry, prompt again
//! or give up.

use thiserror::Error;

use crate::storage::types::{BlobId, CommitHandle, InvalidNameError};

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// the requested branch does not exist
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// the handle does not name a live node in the commit graph
    #[error("commit not found: {0}")]
    CommitNotFound(CommitHandle),

    /// no blob is stored under the id (or revision)
    #[error("blob not found: {0}")]
    BlobNotFound(BlobId),

    /// the blob id is reserved for root and merge commit keys
    #[error("blob id {0} is reserved")]
    ReservedBlobId(BlobId),

    /// one commit listed the same blob id more than once
    #[error("blob {0} appears more than once in one commit")]
    DuplicateBlob(BlobId),

    /// a branch with this name already exists
    #[error("branch already exists: {0}")]
    DuplicateBranch(String),

    /// a bounded table is full
    #[error("{resource} capacity exceeded (limit {limit})")]
    CapacityExceeded { resource: &'static str, limit: usize },

    /// linking `parent` under `child` would close a cycle
    #[error("linking {parent} as parent of {child} would create a cycle")]
    Cycle {
        child: CommitHandle,
        parent: CommitHandle,
    },

    /// pop or peek on an empty (or too shallow) history
    #[error("history underflow")]
    Underflow,

    /// the two commits share no ancestor
    #[error("unrelated histories: {ours} and {theirs} share no ancestor")]
    Unrelated {
        ours: CommitHandle,
        theirs: CommitHandle,
    },

    /// reading source content failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// invalid branch name
    #[error("invalid branch name: {0}")]
    InvalidBranchName(#[from] InvalidNameError),

    /// a branch may only advance to a direct child of its head
    #[error("cannot advance {branch} to {target}: its primary parent is not {head}")]
    NotFastForward {
        branch: String,
        head: CommitHandle,
        target: CommitHandle,
    },

    /// the commit cannot be removed without orphaning a branch
    #[error("commit {0} is a root commit referenced by a branch")]
    ProtectedCommit(CommitHandle),

    /// the merge reported conflicts, so no merge commit was written
    #[error("merge has {0} conflicting blob(s)")]
    MergeConflict(usize),

    /// the current branch cannot be deleted
    #[error("cannot delete the checked out branch {0}")]
    BranchCheckedOut(String),

    /// no branch is checked out
    #[error("no branch is checked out")]
    Detached,

    /// invalid repository configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON export failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::BranchNotFound(_)
                | StorageError::CommitNotFound(_)
                | StorageError::BlobNotFound(_)
        )
    }

    /// check if this error was raised to protect the shape of the graph
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Cycle { .. }
                | StorageError::NotFastForward { .. }
                | StorageError::ProtectedCommit(_)
        )
    }

    /// check if a fixed bound was hit
    pub fn is_capacity(&self) -> bool {
        matches!(self, StorageError::CapacityExceeded { .. })
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = StorageError::BranchNotFound("dev".to_string());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_integrity_violation());

        let cycle = StorageError::Cycle {
            child: CommitHandle::new(1),
            parent: CommitHandle::new(2),
        };
        assert!(!cycle.is_not_found());
        assert!(cycle.is_integrity_violation());

        let full = StorageError::CapacityExceeded { resource: "branch table", limit: 10 };
        assert!(full.is_capacity());
        assert_eq!(full.to_string(), "branch table capacity exceeded (limit 10)");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(!err.is_not_found());
    }
}
