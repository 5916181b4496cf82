//! Operation set for porcelain layers.
//!
//! Thin free-function wrappers over [`Repository`] and [`HistoryStack`].
//! A front end (menu, REPL, test harness) can drive a whole session with
//! these and never touch the storage types directly.

use crate::history::HistoryStack;
use crate::storage::{
    ancestry, BlobId, BranchRef, CommitHandle, MergeResult, Repository, StorageResult,
};

/// create a repository seeded with `main` and a root commit
pub fn init_repository(name: &str) -> StorageResult<Repository> {
    Repository::init(name)
}

/// commit `blob_bytes` on the current branch
pub fn commit(
    repo: &mut Repository,
    blob_bytes: impl Into<Vec<u8>>,
    message: &str,
    author: &str,
    blob_id: Option<BlobId>,
) -> StorageResult<CommitHandle> {
    repo.commit(blob_bytes, message, author, blob_id)
}

/// branch off the current head
pub fn create_branch(repo: &mut Repository, name: &str) -> StorageResult<BranchRef> {
    repo.create_branch(name)
}

pub fn checkout(repo: &mut Repository, name: &str) -> StorageResult<()> {
    repo.checkout(name)
}

pub fn merge(repo: &Repository, a: CommitHandle, b: CommitHandle) -> StorageResult<MergeResult> {
    repo.merge(a, b)
}

/// delete the commit on top of `history` from the repository
pub fn delete_most_recent(repo: &mut Repository, history: &mut HistoryStack) -> StorageResult<()> {
    repo.delete_most_recent(history).map(|_| ())
}

/// the state an undo would return to
pub fn undo_peek(history: &HistoryStack) -> StorageResult<CommitHandle> {
    history.peek_second()
}

pub fn bfs_collect(repo: &Repository, start: CommitHandle) -> StorageResult<Vec<CommitHandle>> {
    ancestry::breadth_first_collect(repo.graph(), start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_session() {
        let mut repo = init_repository("r").unwrap();
        let mut history = HistoryStack::new();

        let n1 = commit(&mut repo, "hello", "m1", "a", Some(BlobId::new(1))).unwrap();
        history.push(n1);
        let n2 = commit(&mut repo, "world", "m2", "a", Some(BlobId::new(2))).unwrap();
        history.push(n2);

        assert_eq!(repo.common_ancestor(n1, n2).unwrap(), Some(n1));
        assert_eq!(undo_peek(&history).unwrap(), n1);

        let lineage = bfs_collect(&repo, n2).unwrap();
        assert_eq!(lineage.len(), 3);
        assert_eq!(&lineage[..2], &[n2, n1]);

        delete_most_recent(&mut repo, &mut history).unwrap();
        assert_eq!(repo.head().unwrap(), n1);
        assert!(matches!(undo_peek(&history), Err(StorageError::Underflow)));
    }

    #[test]
    fn test_branch_and_merge() {
        let mut repo = init_repository("r").unwrap();
        commit(&mut repo, "base", "m0", "a", Some(BlobId::new(1))).unwrap();

        assert!(matches!(
            create_branch(&mut repo, "main"),
            Err(StorageError::DuplicateBranch(_))
        ));
        let dev = create_branch(&mut repo, "dev").unwrap();
        checkout(&mut repo, "dev").unwrap();
        let theirs = commit(&mut repo, "dev work", "d1", "b", Some(BlobId::new(2))).unwrap();

        let result = merge(&repo, dev.head, theirs).unwrap();
        assert!(result.is_clean());
        assert!(result.is_fast_forward());

        assert!(checkout(&mut repo, "missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_with_empty_history() {
        let mut repo = init_repository("r").unwrap();
        let mut history = HistoryStack::new();
        assert!(matches!(
            delete_most_recent(&mut repo, &mut history),
            Err(StorageError::Underflow)
        ));
        assert!(matches!(history.pop(), Err(StorageError::Underflow)));
    }
}
