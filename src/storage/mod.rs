//! storage layer for minivcs
//!
//! this module holds the whole version-control engine. Callers go through
//! [`Repository`] (or the free functions in [`crate::api`]) and never mutate
//! the graph or the blob store directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │   (commit, branch, checkout, merge, undo, export)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    refs     │       │    merge    │       │    blob     │
//!  │ (branches)  │       │ (3-way cmp) │       │ (content)   │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │
//!         │                     ▼
//!         │              ┌─────────────┐
//!         │              │  ancestry   │
//!         │              │ (bfs, lca)  │
//!         │              └─────────────┘
//!         │                     │
//!         └──────────┬──────────┘
//!                    ▼
//!             ┌─────────────┐
//!             │   commit    │
//!             │ (DAG arena) │
//!             └─────────────┘
//!  ```
//!
//! # Usage
//!
//! ```ignore
//! use minivcs::storage::{BlobId, Repository};
//!
//! let mut repo = Repository::init("demo")?;
//! let first = repo.commit(b"hello".to_vec(), "m1", "alice", Some(BlobId::new(1)))?;
//! let second = repo.commit(b"world".to_vec(), "m2", "alice", Some(BlobId::new(2)))?;
//!
//! assert_eq!(repo.common_ancestor(first, second)?, Some(first));
//! println!("{}", repo.stats());
//! ```

pub mod ancestry;
mod blob;
mod commit;
mod config;
mod error;
pub mod merge;
mod refs;
mod repository;
mod types;

// Re-export public API
pub use blob::{read_source, Blob, BlobMetadata, BlobStore};
pub use commit::{Commit, CommitGraph, CommitNode, NodeState, TIMESTAMP_FORMAT};
pub use config::RepositoryConfig;
pub use error::{StorageError, StorageResult};
pub use merge::{BlobOutcome, MergeEntry, MergeResult, MergeSide};
pub use refs::{BranchRef, BranchTable};
pub use repository::{CommitView, Repository, RepositorySnapshot, RepositoryStats};
pub use types::{BlobId, BlobRef, BranchName, CommitHandle, CommitId, IdGenerator, InvalidNameError};
