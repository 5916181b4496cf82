//!   In-memory repository aggregate.
//!
//!  This is the central component of the storage layer. It owns the commit
//!  graph, the blob store, the branch table and the blob id generator, and
//!  exposes the high-level operations (commit, branch, checkout, merge,
//!  undo) the porcelain layer uses.
//!
//! Every public operation is all-or-nothing: inputs are validated before
//! anything is written, so a failed call leaves the repository exactly as
//! it was.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::history::HistoryStack;
use crate::storage::ancestry;
use crate::storage::blob::{self, Blob, BlobMetadata, BlobStore};
use crate::storage::commit::{Commit, CommitGraph};
use crate::storage::config::RepositoryConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::merge::{self, BlobOutcome, MergeResult, MergeSide};
use crate::storage::refs::{BranchRef, BranchTable};
use crate::storage::types::{BlobId, BranchName, CommitHandle, CommitId, IdGenerator};

/// The repository: commit graph, blob store and branch table of one session.
///
/// Clone this to take an independent deep copy (see [`Repository::fork`]).
#[derive(Debug, Clone)]
pub struct Repository {
    name: String,
    config: RepositoryConfig,
    graph: CommitGraph,
    blobs: BlobStore,
    branches: BranchTable,
    ids: IdGenerator,
}

impl Repository {
    /// Initialize a repository with the default configuration.
    pub fn init(name: impl Into<String>) -> StorageResult<Self> {
        Self::init_with_config(name, RepositoryConfig::default())
    }

    /// Initialize a repository.
    ///
    /// Seeds the default branch with a root commit and checks it out.
    pub fn init_with_config(name: impl Into<String>, config: RepositoryConfig) -> StorageResult<Self> {
        let name = name.into();
        let default_branch = config.validate()?;

        let mut graph = CommitGraph::new();
        let root = graph.create_commit(
            CommitId::ROOT,
            format!("Initial commit for repository '{}'", name),
            config.root_author.as_str(),
            Vec::new(),
        );

        let mut branches = BranchTable::new(config.max_branches);
        branches.insert(default_branch.clone(), root)?;
        branches.checkout(&default_branch)?;

        tracing::info!(repository = %name, branch = %default_branch, "initialized repository");
        Ok(Self {
            ids: IdGenerator::new(config.first_blob_id),
            name,
            config,
            graph,
            blobs: BlobStore::new(),
            branches,
        })
    }

    // ==================== Commits ====================

    /// Commit one blob on the current branch.
    ///
    /// With `blob_id` unset the id generator picks the next free id.
    pub fn commit(
        &mut self,
        bytes: impl Into<Vec<u8>>,
        message: &str,
        author: &str,
        blob_id: Option<BlobId>,
    ) -> StorageResult<CommitHandle> {
        self.commit_blobs(vec![(blob_id, bytes.into())], message, author)
    }

    /// Read `path` and commit its content as one blob.
    ///
    /// A read failure returns `Io` and leaves the repository untouched.
    pub fn commit_file(
        &mut self,
        path: impl AsRef<Path>,
        message: &str,
        author: &str,
        blob_id: Option<BlobId>,
    ) -> StorageResult<CommitHandle> {
        let bytes = blob::read_source(path)?;
        self.commit(bytes, message, author, blob_id)
    }

    /// Commit several blobs at once on the current branch.
    ///
    /// The commit is keyed by its first blob id. Writing to an id that
    /// already exists chains a new revision of that blob. Each id may appear
    /// once per commit, and [`BlobId::RESERVED`] may not appear at all.
    pub fn commit_blobs(
        &mut self,
        blobs: Vec<(Option<BlobId>, Vec<u8>)>,
        message: &str,
        author: &str,
    ) -> StorageResult<CommitHandle> {
        let branch = self.current_ref()?.clone();
        if blobs.len() > self.config.max_blobs_per_commit {
            return Err(StorageError::CapacityExceeded {
                resource: "commit blob list",
                limit: self.config.max_blobs_per_commit,
            });
        }
        self.graph.get(branch.head)?;

        let mut explicit = HashSet::new();
        for id in blobs.iter().filter_map(|(id, _)| *id) {
            if id == BlobId::RESERVED {
                return Err(StorageError::ReservedBlobId(id));
            }
            if !explicit.insert(id) {
                return Err(StorageError::DuplicateBlob(id));
            }
        }
        let mut blob_refs = Vec::with_capacity(blobs.len());
        for (id, bytes) in blobs {
            let id = match id {
                Some(id) => id,
                None => self
                    .ids
                    .allocate(|candidate| self.blobs.contains(candidate) || explicit.contains(&candidate)),
            };
            blob_refs.push(self.blobs.put(id, bytes).blob_ref());
        }

        let key = blob_refs.first().map_or(CommitId::ROOT, |r| CommitId::from(r.id));
        let node = self.graph.create_commit(key, message, author, blob_refs);
        self.graph.link(node, branch.head)?;
        self.branches.advance(&self.graph, &branch.name, node)?;

        tracing::info!(branch = %branch.name, commit = %node, key = %key, "committed");
        Ok(node)
    }

    /// Merge `other` into the current branch with a merge commit.
    ///
    /// The new node's primary parent is the current head and its parent
    /// list holds `other`'s head. It references the blobs `other` added.
    /// Nothing is written when the merge reports conflicts, or when `other`
    /// is already contained in the current branch; the latter returns the
    /// current head.
    pub fn commit_merge(&mut self, other: &str, message: &str, author: &str) -> StorageResult<CommitHandle> {
        let branch = self.current_ref()?.clone();
        let theirs = self.head_of(other)?;
        let result = self.merge(branch.head, theirs)?;
        if result.ancestor == theirs {
            tracing::info!(branch = %branch.name, other, "already up to date");
            return Ok(branch.head);
        }
        if !result.is_clean() {
            let conflicts = result.conflicts();
            tracing::warn!(branch = %branch.name, other, conflicts = conflicts.len(), "merge refused");
            return Err(StorageError::MergeConflict(conflicts.len()));
        }

        let blob_refs = result
            .side(MergeSide::Theirs)
            .filter(|e| matches!(e.outcome, BlobOutcome::Added(_)))
            .map(|e| e.revision)
            .collect();
        let node = self.graph.create_commit(CommitId::ROOT, message, author, blob_refs);
        self.graph.link(node, branch.head)?;
        self.graph.link(node, theirs)?;
        self.branches.advance(&self.graph, &branch.name, node)?;

        tracing::info!(branch = %branch.name, other, commit = %node, "created merge commit");
        Ok(node)
    }

    /// Delete the commit on top of `history`.
    ///
    /// Branches pointing at it fall back to its primary parent. A root commit
    /// that a branch still points at cannot be deleted. On any error neither
    /// the repository nor `history` changes.
    pub fn delete_most_recent(&mut self, history: &mut HistoryStack) -> StorageResult<Commit> {
        let target = history.peek()?;
        let parent = self.graph.get(target)?.parent();
        let pointing = self.branches.pointing_at(target);

        let retarget = match parent {
            Some(parent) => parent,
            None if pointing.is_empty() => target,
            None => return Err(StorageError::ProtectedCommit(target)),
        };

        history.pop()?;
        for name in &pointing {
            self.branches.set_head(name, retarget)?;
        }
        let removed = self.graph.delete(target)?;

        tracing::info!(commit = %target, moved_branches = pointing.len(), "deleted most recent commit");
        Ok(removed)
    }

    // ==================== Branches ====================

    /// Create a branch at the current head. The checked-out branch is unchanged.
    pub fn create_branch(&mut self, name: &str) -> StorageResult<BranchRef> {
        let name = BranchName::new(name)?;
        let from = self.current_ref()?.name.clone();
        self.branches.create(name, &from).cloned()
    }

    /// Create a branch whose head is a new parentless root commit.
    pub fn create_orphan_branch(&mut self, name: &str) -> StorageResult<BranchRef> {
        let name = BranchName::new(name)?;
        self.branches.check_insert(&name)?;

        let root = self.graph.create_commit(
            CommitId::ROOT,
            format!("Initial commit for branch '{}'", name),
            self.config.root_author.as_str(),
            Vec::new(),
        );
        self.branches.insert(name, root).cloned()
    }

    pub fn checkout(&mut self, name: &str) -> StorageResult<()> {
        self.branches.checkout(&BranchName::new(name)?)
    }

    /// Delete a branch. Its commits stay in the graph.
    pub fn delete_branch(&mut self, name: &str) -> StorageResult<BranchRef> {
        self.branches.delete(&BranchName::new(name)?)
    }

    /// the head commit of `name`
    pub fn head_of(&self, name: &str) -> StorageResult<CommitHandle> {
        self.branches.head(&BranchName::new(name)?)
    }

    /// the head commit of the current branch
    pub fn head(&self) -> StorageResult<CommitHandle> {
        self.current_ref().map(|b| b.head)
    }

    pub fn current_branch(&self) -> Option<&BranchName> {
        self.branches.current().map(|b| &b.name)
    }

    pub fn list_branches(&self) -> Vec<BranchRef> {
        self.branches.iter().cloned().collect()
    }

    fn current_ref(&self) -> StorageResult<&BranchRef> {
        self.branches.current().ok_or(StorageError::Detached)
    }

    // ==================== History ====================

    /// Analyse merging `b` into `a`.
    pub fn merge(&self, a: CommitHandle, b: CommitHandle) -> StorageResult<MergeResult> {
        merge::merge(&self.graph, &self.blobs, a, b)
    }

    pub fn common_ancestor(&self, a: CommitHandle, b: CommitHandle) -> StorageResult<Option<CommitHandle>> {
        ancestry::common_ancestor(&self.graph, a, b)
    }

    /// Primary-parent history from `from`, newest first, at most `limit` commits.
    pub fn log(&self, from: CommitHandle, limit: usize) -> StorageResult<Vec<(CommitHandle, &Commit)>> {
        let mut entries = Vec::new();
        let mut cursor = Some(from);
        while let Some(handle) = cursor {
            if entries.len() >= limit {
                break;
            }
            let node = self.graph.get(handle)?;
            entries.push((handle, node.commit()));
            cursor = node.parent();
        }
        Ok(entries)
    }

    /// Blob contents along a branch's primary-parent chain.
    ///
    /// Newest commit first; each blob id is reported once, at the revision
    /// the newest commit referencing it pinned.
    pub fn branch_contents(&self, name: &str) -> StorageResult<Vec<&Blob>> {
        let head = self.head_of(name)?;
        let mut seen = HashSet::new();
        let mut contents = Vec::new();
        for handle in ancestry::first_parent_walk(&self.graph, head)? {
            for blob_ref in &self.graph.commit(handle)?.blob_refs {
                if seen.insert(blob_ref.id) {
                    contents.push(self.blobs.get_revision(*blob_ref)?);
                }
            }
        }
        Ok(contents)
    }

    // ==================== Whole repository ====================

    /// Deep copy of this repository under a new name.
    ///
    /// Handles stay valid in the copy, and the two evolve independently.
    pub fn fork(&self, name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.name = name.into();
        tracing::info!(from = %self.name, to = %copy.name, "forked repository");
        copy
    }

    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            branch_count: self.branches.len(),
            commit_count: self.graph.len(),
            blob_count: self.blobs.len(),
            blob_revisions: self.blobs.revision_count(),
        }
    }

    /// read-only export of branches, commits and blob metadata
    pub fn snapshot(&self) -> RepositorySnapshot {
        RepositorySnapshot {
            name: self.name.clone(),
            current_branch: self.current_branch().cloned(),
            branches: self.list_branches(),
            commits: self
                .graph
                .iter()
                .map(|(handle, node)| CommitView {
                    handle,
                    parent: node.parent(),
                    parent_list: node.parent_list().to_vec(),
                    commit: node.commit().clone(),
                })
                .collect(),
            blobs: self.blobs.metadata(),
        }
    }

    pub fn snapshot_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    // ==================== Accessors ====================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn branches(&self) -> &BranchTable {
        &self.branches
    }
}

/// one commit node in a [`RepositorySnapshot`]
#[derive(Debug, Clone, Serialize)]
pub struct CommitView {
    pub handle: CommitHandle,
    pub parent: Option<CommitHandle>,
    pub parent_list: Vec<CommitHandle>,
    #[serde(flatten)]
    pub commit: Commit,
}

/// Serializable view of a whole repository.
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySnapshot {
    pub name: String,
    pub current_branch: Option<BranchName>,
    pub branches: Vec<BranchRef>,
    pub commits: Vec<CommitView>,
    pub blobs: Vec<BlobMetadata>,
}

/// Statistics about the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryStats {
    pub branch_count: usize,
    pub commit_count: usize,
    pub blob_count: usize,
    pub blob_revisions: usize,
}

impl fmt::Display for RepositoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository Statistics:")?;
        writeln!(f, "  Branches: {}", self.branch_count)?;
        writeln!(f, "  Commits: {}", self.commit_count)?;
        writeln!(f, "  Blobs: {}", self.blob_count)?;
        writeln!(f, "  Blob Revisions: {}", self.blob_revisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> Repository {
        Repository::init("r").unwrap()
    }

    #[test]
    fn test_init() {
        let repo = setup();
        assert_eq!(repo.name(), "r");
        assert_eq!(repo.current_branch().unwrap().as_str(), "main");

        let head = repo.head().unwrap();
        let root = repo.graph().commit(head).unwrap();
        assert_eq!(root.id, CommitId::ROOT);
        assert_eq!(root.author, "System");
        assert_eq!(root.message, "Initial commit for repository 'r'");
        assert_eq!(repo.stats().commit_count, 1);
    }

    #[test]
    fn test_init_rejects_bad_config() {
        let result = Repository::init_with_config("r", RepositoryConfig::default().max_branches(0));
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));

        let result = Repository::init_with_config("r", RepositoryConfig::default().default_branch("a b"));
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_linear_commits_share_ancestor() {
        let mut repo = setup();
        let n1 = repo.commit("hello", "m1", "a", Some(BlobId::new(1))).unwrap();
        let n2 = repo.commit("world", "m2", "a", Some(BlobId::new(2))).unwrap();

        assert_eq!(repo.graph().get(n2).unwrap().parent(), Some(n1));
        assert_eq!(repo.common_ancestor(n1, n2).unwrap(), Some(n1));
        assert_eq!(repo.common_ancestor(n2, n1).unwrap(), Some(n1));
        assert_eq!(repo.head().unwrap(), n2);
        assert_eq!(repo.blobs().get(BlobId::new(2)).unwrap().bytes, b"world");
    }

    #[test]
    fn test_commit_generates_ids() {
        let config = RepositoryConfig::default().first_blob_id(5);
        let mut repo = Repository::init_with_config("r", config).unwrap();

        // 6 is taken explicitly, so generation skips it
        repo.commit("x", "explicit", "a", Some(BlobId::new(6))).unwrap();
        let first = repo.commit("y", "gen", "a", None).unwrap();
        let second = repo.commit("z", "gen", "a", None).unwrap();

        assert_eq!(repo.graph().commit(first).unwrap().id, CommitId::new(5));
        assert_eq!(repo.graph().commit(second).unwrap().id, CommitId::new(7));
        assert_eq!(repo.graph().lookup_bucket(CommitId::new(7)), vec![second]);
    }

    #[test]
    fn test_commit_blobs_capacity() {
        let config = RepositoryConfig::default().max_blobs_per_commit(2);
        let mut repo = Repository::init_with_config("r", config).unwrap();
        let before = repo.stats();

        let blobs = vec![(None, b"a".to_vec()), (None, b"b".to_vec()), (None, b"c".to_vec())];
        let result = repo.commit_blobs(blobs, "too many", "a");
        assert!(matches!(result, Err(StorageError::CapacityExceeded { limit: 2, .. })));
        assert_eq!(repo.stats(), before);

        let blobs = vec![(Some(BlobId::new(3)), b"a".to_vec()), (None, b"b".to_vec())];
        let node = repo.commit_blobs(blobs, "pair", "a").unwrap();
        let ids: Vec<_> = repo.graph().commit(node).unwrap().blob_ids().collect();
        assert_eq!(ids, vec![BlobId::new(3), BlobId::new(1)]);
    }

    #[test]
    fn test_commit_blobs_rejects_repeated_id() {
        let mut repo = setup();
        let head = repo.head().unwrap();

        let blobs = vec![(Some(BlobId::new(1)), b"a".to_vec()), (Some(BlobId::new(1)), b"b".to_vec())];
        let result = repo.commit_blobs(blobs, "twice", "a");
        assert!(matches!(result, Err(StorageError::DuplicateBlob(id)) if id == BlobId::new(1)));
        assert!(!repo.blobs().contains(BlobId::new(1)));
        assert_eq!(repo.head().unwrap(), head);
    }

    #[test]
    fn test_reserved_blob_id() {
        let mut repo = setup();
        let before = repo.stats();

        let result = repo.commit("zero", "m", "a", Some(BlobId::RESERVED));
        assert!(matches!(result, Err(StorageError::ReservedBlobId(_))));
        assert_eq!(repo.stats(), before);
        // only the root commit is keyed by the reserved id
        assert_eq!(repo.graph().lookup_bucket(CommitId::ROOT), vec![repo.head().unwrap()]);
    }

    #[test]
    fn test_commit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "line one\nline two\n").unwrap();

        let mut repo = setup();
        let node = repo.commit_file(&path, "add notes", "a", Some(BlobId::new(9))).unwrap();
        assert_eq!(repo.head().unwrap(), node);
        assert_eq!(
            repo.blobs().get(BlobId::new(9)).unwrap().as_str(),
            Some("line one\nline two\n")
        );
    }

    #[test]
    fn test_commit_file_io_error_leaves_repository_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut repo = setup();
        let head = repo.head().unwrap();
        let before = repo.stats();

        let result = repo.commit_file(dir.path().join("missing.txt"), "m", "a", None);
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(repo.stats(), before);
        assert_eq!(repo.head().unwrap(), head);
    }

    #[test]
    fn test_unrelated_histories() {
        let mut repo = setup();
        repo.create_orphan_branch("x").unwrap();
        repo.create_orphan_branch("y").unwrap();

        repo.checkout("x").unwrap();
        let x = repo.commit("ten", "on x", "a", Some(BlobId::new(10))).unwrap();
        repo.checkout("y").unwrap();
        let y = repo.commit("twenty", "on y", "a", Some(BlobId::new(20))).unwrap();

        assert_eq!(repo.common_ancestor(x, y).unwrap(), None);
        assert!(matches!(repo.merge(x, y), Err(StorageError::Unrelated { .. })));
    }

    #[test]
    fn test_duplicate_main() {
        let mut repo = setup();
        let result = repo.create_branch("main");
        assert!(matches!(result, Err(StorageError::DuplicateBranch(n)) if n == "main"));
    }

    #[test]
    fn test_create_branch_clones_head() {
        let mut repo = setup();
        let base = repo.commit("v1", "m1", "a", Some(BlobId::new(1))).unwrap();

        let dev = repo.create_branch("dev").unwrap();
        assert_eq!(dev.head, base);
        // creating does not switch
        assert_eq!(repo.current_branch().unwrap().as_str(), "main");

        repo.commit("v2", "m2", "a", Some(BlobId::new(2))).unwrap();
        assert_eq!(repo.head_of("dev").unwrap(), base);
        assert_ne!(repo.head_of("main").unwrap(), base);
    }

    #[test]
    fn test_branch_capacity() {
        let config = RepositoryConfig::default().max_branches(2);
        let mut repo = Repository::init_with_config("r", config).unwrap();
        repo.create_branch("one").unwrap();

        let commits = repo.graph().len();
        assert!(repo.create_branch("two").unwrap_err().is_capacity());
        assert!(repo.create_orphan_branch("three").unwrap_err().is_capacity());
        // the orphan's root commit was never created
        assert_eq!(repo.graph().len(), commits);
    }

    #[test]
    fn test_checkout_and_delete_branch() {
        let mut repo = setup();
        assert!(repo.checkout("ghost").unwrap_err().is_not_found());
        assert!(matches!(repo.checkout("bad name"), Err(StorageError::InvalidBranchName(_))));

        repo.create_branch("dev").unwrap();
        repo.checkout("dev").unwrap();
        assert!(matches!(repo.delete_branch("dev"), Err(StorageError::BranchCheckedOut(_))));

        repo.checkout("main").unwrap();
        repo.delete_branch("dev").unwrap();
        assert_eq!(repo.list_branches().len(), 1);
    }

    #[test]
    fn test_commit_merge() {
        let mut repo = setup();
        repo.commit("shared", "base", "a", Some(BlobId::new(1))).unwrap();
        repo.create_branch("feature").unwrap();

        repo.checkout("feature").unwrap();
        let theirs = repo.commit("feature work", "f1", "b", Some(BlobId::new(2))).unwrap();
        repo.checkout("main").unwrap();
        let ours = repo.commit("main work", "m1", "a", Some(BlobId::new(3))).unwrap();

        let merged = repo.commit_merge("feature", "merge feature", "a").unwrap();
        let node = repo.graph().get(merged).unwrap();
        assert!(node.is_merge());
        assert_eq!(node.parent(), Some(ours));
        assert_eq!(node.parent_list(), &[theirs]);
        assert_eq!(node.commit().blob_ids().collect::<Vec<_>>(), vec![BlobId::new(2)]);
        assert_eq!(repo.head().unwrap(), merged);

        let contents: Vec<_> = repo
            .branch_contents("main")
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(contents, vec![BlobId::new(2), BlobId::new(3), BlobId::new(1)]);
    }

    #[test]
    fn test_commit_merge_already_contained() {
        let mut repo = setup();
        repo.commit("a", "m1", "x", Some(BlobId::new(1))).unwrap();
        repo.create_branch("old").unwrap();
        let head = repo.commit("b", "m2", "x", Some(BlobId::new(2))).unwrap();
        let commits = repo.graph().len();

        // merging a branch into itself
        assert_eq!(repo.commit_merge("main", "self", "x").unwrap(), head);
        // merging a branch main already contains
        assert_eq!(repo.commit_merge("old", "stale", "x").unwrap(), head);

        assert_eq!(repo.head().unwrap(), head);
        assert_eq!(repo.graph().len(), commits);
    }

    #[test]
    fn test_commit_merge_refuses_conflicts() {
        let mut repo = setup();
        repo.commit("original", "base", "a", Some(BlobId::new(1))).unwrap();
        repo.create_branch("feature").unwrap();
        repo.checkout("feature").unwrap();
        repo.commit("changed", "edit", "b", Some(BlobId::new(1))).unwrap();
        repo.checkout("main").unwrap();
        let head = repo.head().unwrap();

        let result = repo.commit_merge("feature", "merge", "a");
        assert!(matches!(result, Err(StorageError::MergeConflict(1))));
        assert_eq!(repo.head().unwrap(), head);
    }

    #[test]
    fn test_delete_most_recent() {
        let mut repo = setup();
        let mut history = HistoryStack::new();
        assert!(matches!(repo.delete_most_recent(&mut history), Err(StorageError::Underflow)));

        let n1 = repo.commit("a", "m1", "x", Some(BlobId::new(1))).unwrap();
        history.push(n1);
        let n2 = repo.commit("b", "m2", "x", Some(BlobId::new(2))).unwrap();
        history.push(n2);

        let removed = repo.delete_most_recent(&mut history).unwrap();
        assert_eq!(removed.message, "m2");
        assert_eq!(repo.head().unwrap(), n1);
        assert_eq!(history.peek().unwrap(), n1);
        assert!(!repo.graph().contains(n2));
        // blobs are never released by commit deletion
        assert!(repo.blobs().contains(BlobId::new(2)));
    }

    #[test]
    fn test_delete_most_recent_stale_frame() {
        let mut repo = setup();
        let mut history = HistoryStack::new();
        let n1 = repo.commit("a", "m1", "x", None).unwrap();
        history.push(n1);
        history.push(n1);

        repo.delete_most_recent(&mut history).unwrap();
        let result = repo.delete_most_recent(&mut history);
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_delete_protects_branch_roots() {
        let mut repo = setup();
        let mut history = HistoryStack::new();
        history.push(repo.head().unwrap());

        let result = repo.delete_most_recent(&mut history);
        assert!(matches!(result, Err(StorageError::ProtectedCommit(_))));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_log() {
        let mut repo = setup();
        repo.commit("a", "first", "x", None).unwrap();
        let tip = repo.commit("b", "second", "x", None).unwrap();

        let log = repo.log(tip, 10).unwrap();
        let messages: Vec<_> = log.iter().map(|(_, c)| c.summary()).collect();
        assert_eq!(messages, vec!["second", "first", "Initial commit for repository 'r'"]);
        assert_eq!(repo.log(tip, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_branch_contents_newest_revision_wins() {
        let mut repo = setup();
        repo.commit("v1", "m1", "x", Some(BlobId::new(1))).unwrap();
        repo.commit("v2", "m2", "x", Some(BlobId::new(1))).unwrap();

        let contents = repo.branch_contents("main").unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].bytes, b"v2");
        assert_eq!(contents[0].revision, 1);
    }

    #[test]
    fn test_fork_is_independent() {
        let mut repo = setup();
        let n1 = repo.commit("a", "m1", "x", None).unwrap();

        let mut copy = repo.fork("copy");
        assert_eq!(copy.name(), "copy");
        assert_eq!(copy.head().unwrap(), n1);

        copy.commit("b", "only in copy", "x", None).unwrap();
        assert_eq!(repo.head().unwrap(), n1);
        assert_eq!(repo.stats().commit_count + 1, copy.stats().commit_count);
    }

    #[test]
    fn test_stats() {
        let mut repo = setup();
        repo.commit("a", "m1", "x", Some(BlobId::new(1))).unwrap();
        repo.commit("b", "m2", "x", Some(BlobId::new(1))).unwrap();
        repo.create_branch("dev").unwrap();

        let stats = repo.stats();
        assert_eq!(stats.branch_count, 2);
        assert_eq!(stats.commit_count, 3);
        assert_eq!(stats.blob_count, 1);
        assert_eq!(stats.blob_revisions, 2);
        assert!(stats.to_string().contains("Blob Revisions: 2"));
    }

    #[test]
    fn test_snapshot_json() {
        let mut repo = setup();
        repo.commit("hello", "m1", "alice", Some(BlobId::new(1))).unwrap();

        let json: serde_json::Value = serde_json::from_str(&repo.snapshot_json().unwrap()).unwrap();
        assert_eq!(json["name"], "r");
        assert_eq!(json["current_branch"], "main");
        assert_eq!(json["commits"].as_array().unwrap().len(), 2);
        assert_eq!(json["commits"][1]["author"], "alice");
        assert_eq!(json["blobs"][0]["size"], 5);
    }
}
