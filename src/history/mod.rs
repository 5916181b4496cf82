//! Caller-owned history structures.
//!
//! The repository never owns these. A frame is a plain [`CommitHandle`],
//! so deleting a commit from the graph can never free memory a frame still
//! points at; a stale frame simply fails its next lookup.
//!
//! # Usage
//!
//! ```ignore
//! use minivcs::history::HistoryStack;
//!
//! let mut history = HistoryStack::new();
//! history.push(repo.commit(b"hello".to_vec(), "m1", "alice", None)?);
//! history.push(repo.commit(b"world".to_vec(), "m2", "alice", None)?);
//!
//! // undo: look at the state before the latest commit
//! let previous = history.peek_second()?;
//! ```

mod queue;
mod stack;

pub use queue::HistoryQueue;
pub use stack::HistoryStack;
