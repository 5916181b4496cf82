//! minivcs - A minimal in-memory version-control engine
//!
//! This crate provides the core of a small version-control system: a blob
//! store with revision chains, a commit DAG with multi-parent merges, named
//! branches, ancestor search and undo history. Nothing is persisted; a
//! repository lives for one session.
//!
//! # Example
//!
//! ```
//! use minivcs::storage::{BlobId, Repository};
//!
//! let mut repo = Repository::init("demo").unwrap();
//! let first = repo.commit("hello", "m1", "alice", Some(BlobId::new(1))).unwrap();
//! let second = repo.commit("world", "m2", "alice", Some(BlobId::new(2))).unwrap();
//! assert_eq!(repo.common_ancestor(first, second).unwrap(), Some(first));
//! ```

pub mod api;
pub mod history;
pub mod storage;
