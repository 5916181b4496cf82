//! core type-safe identifiers and names for the storage layer.

use std::fmt;
use std::fmt::Formatter;

use serde::Serialize;

/// Integer identifier of a blob.
///
/// Ids are either supplied by the caller or handed out by the repository's
/// [`IdGenerator`]. Several revisions may be chained under one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlobId(u64);

impl BlobId {
    /// reserved: commits keyed by it are root and merge commits
    pub const RESERVED: BlobId = BlobId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// raw integer value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A pinned blob revision, as referenced by a commit.
///
/// Commits pin the revision they saw so that later writes to the same id
/// never change what an old commit points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlobRef {
    pub id: BlobId,
    pub revision: u32,
}

impl BlobRef {
    pub fn new(id: BlobId, revision: u32) -> Self {
        Self { id, revision }
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.revision)
    }
}

/// The key a commit is filed under in the commit graph's chains.
///
/// For ordinary commits this is the id of the first blob they reference;
/// root and merge commits without blobs use [`CommitId::ROOT`]. Keys are not
/// unique; use a [`CommitHandle`] to name one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommitId(u64);

impl CommitId {
    pub const ROOT: CommitId = CommitId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BlobId> for CommitId {
    fn from(id: BlobId) -> Self {
        Self(id.get())
    }
}

/// Stable handle to a node in the commit graph arena.
///
/// Handles are never reused within a graph. Once a node is deleted its
/// handle stays invalid and every lookup through it reports not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommitHandle(u32);

impl CommitHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// arena slot (for internal use only)
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CommitHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A validated branch name.
///
/// Valid names:
/// - 1-64 characters
/// - no whitespace or control characters
/// - no `..`, and no leading or trailing `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BranchName(String);

impl BranchName {
    /// the default branch name
    pub const MAIN: &'static str = "main";

    const MAX_LEN: usize = 64;

    /// create a new BranchName, validating the input
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }

        if name.len() > Self::MAX_LEN {
            return Err(InvalidNameError::TooLong(name.len()));
        }

        for (i, c) in name.chars().enumerate() {
            if c.is_whitespace() || c.is_control() {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        if name.contains("..") || name.starts_with('/') || name.ends_with('/') {
            return Err(InvalidNameError::InvalidPath(name.to_string()));
        }

        Ok(())
    }

    /// create the main branch name
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// error type for invalid branch names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidCharacter { char: char, position: usize },
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} characters", len),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character {:?} at position {}", char, position)
            }
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

/// Hands out blob ids for content committed without an explicit id.
///
/// Owned by the repository and seeded from its configuration, so tests can
/// predict every generated id.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        Self { next: seed }
    }

    /// the id the next allocation will try first
    pub fn peek(&self) -> BlobId {
        BlobId(self.next)
    }

    /// allocate the next id for which `is_taken` answers false, never
    /// handing out [`BlobId::RESERVED`]
    pub fn allocate(&mut self, is_taken: impl Fn(BlobId) -> bool) -> BlobId {
        loop {
            let candidate = BlobId(self.next);
            self.next = self.next.wrapping_add(1);
            if candidate != BlobId::RESERVED && !is_taken(candidate) {
                return candidate;
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_valid() {
        assert!(BranchName::new("main").is_ok());
        assert!(BranchName::new("feature/login").is_ok());
        assert!(BranchName::new("fix-42").is_ok());
    }

    #[test]
    fn test_branch_name_invalid() {
        assert_eq!(BranchName::new(""), Err(InvalidNameError::Empty));
        assert!(matches!(BranchName::new("a b"), Err(InvalidNameError::InvalidCharacter { position: 1, .. })));
        assert!(matches!(BranchName::new("a..b"), Err(InvalidNameError::InvalidPath(_))));
        assert!(matches!(BranchName::new("/x"), Err(InvalidNameError::InvalidPath(_))));
        assert!(matches!(BranchName::new("x".repeat(65)), Err(InvalidNameError::TooLong(65))));
    }

    #[test]
    fn test_id_generator_skips_taken_ids() {
        let mut ids = IdGenerator::new(1);
        assert_eq!(ids.allocate(|_| false), BlobId::new(1));

        // 2 and 3 were supplied by a caller already
        let taken = [BlobId::new(2), BlobId::new(3)];
        assert_eq!(ids.allocate(|id| taken.contains(&id)), BlobId::new(4));
        assert_eq!(ids.peek(), BlobId::new(5));
    }

    #[test]
    fn test_id_generator_never_hands_out_reserved() {
        let mut ids = IdGenerator::new(0);
        assert_eq!(ids.allocate(|_| false), BlobId::new(1));

        let mut wrapped = IdGenerator::new(u64::MAX);
        assert_eq!(wrapped.allocate(|_| false), BlobId::new(u64::MAX));
        assert_eq!(wrapped.allocate(|_| false), BlobId::new(1));
    }

    #[test]
    fn test_commit_id_from_blob() {
        assert_eq!(CommitId::from(BlobId::new(7)), CommitId::new(7));
        assert_eq!(CommitId::ROOT.get(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(BlobRef::new(BlobId::new(3), 1).to_string(), "3@1");
        assert_eq!(CommitHandle::new(4).to_string(), "#4");
    }
}
