//! Repository configuration options.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, BranchName};

/// Repository configuration.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Branch seeded (and checked out) by initialization.
    pub default_branch: String,
    /// Upper bound on the number of branches.
    pub max_branches: usize,
    /// Upper bound on blobs referenced by a single commit.
    pub max_blobs_per_commit: usize,
    /// First id the blob id generator hands out.
    pub first_blob_id: u64,
    /// Author recorded on root commits.
    pub root_author: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_branch: BranchName::MAIN.to_string(),
            max_branches: 10,
            max_blobs_per_commit: 100,
            first_blob_id: 1,
            root_author: "System".into(),
        }
    }
}

impl RepositoryConfig {
    /// Set the default branch name.
    pub fn default_branch(mut self, name: impl Into<String>) -> Self {
        self.default_branch = name.into();
        self
    }

    /// Set the branch table bound.
    pub fn max_branches(mut self, value: usize) -> Self {
        self.max_branches = value;
        self
    }

    /// Set the per-commit blob bound.
    pub fn max_blobs_per_commit(mut self, value: usize) -> Self {
        self.max_blobs_per_commit = value;
        self
    }

    /// Seed the blob id generator.
    pub fn first_blob_id(mut self, value: u64) -> Self {
        self.first_blob_id = value;
        self
    }

    /// Set the root commit author.
    pub fn root_author(mut self, value: impl Into<String>) -> Self {
        self.root_author = value.into();
        self
    }

    /// Check the configuration and return the validated default branch.
    pub(crate) fn validate(&self) -> StorageResult<BranchName> {
        if self.max_branches == 0 {
            return Err(StorageError::InvalidConfig(
                "max_branches must be at least 1".into(),
            ));
        }
        if self.first_blob_id == BlobId::RESERVED.get() {
            return Err(StorageError::InvalidConfig(
                "first_blob_id must not be the reserved id 0".into(),
            ));
        }
        if self.max_blobs_per_commit == 0 {
            return Err(StorageError::InvalidConfig(
                "max_blobs_per_commit must be at least 1".into(),
            ));
        }
        BranchName::new(self.default_branch.as_str())
            .map_err(|e| StorageError::InvalidConfig(format!("default branch: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RepositoryConfig::default();
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.max_branches, 10);
        assert_eq!(config.first_blob_id, 1);
        assert_eq!(config.validate().unwrap(), BranchName::main());
    }

    #[test]
    fn test_builder() {
        let config = RepositoryConfig::default()
            .default_branch("trunk")
            .max_branches(3)
            .first_blob_id(100)
            .root_author("init");

        assert_eq!(config.validate().unwrap().as_str(), "trunk");
        assert_eq!(config.max_branches, 3);
        assert_eq!(config.first_blob_id, 100);
        assert_eq!(config.root_author, "init");
    }

    #[test]
    fn test_invalid_config() {
        let zero = RepositoryConfig::default().max_branches(0);
        assert!(matches!(zero.validate(), Err(StorageError::InvalidConfig(_))));

        let bad_name = RepositoryConfig::default().default_branch("");
        assert!(matches!(bad_name.validate(), Err(StorageError::InvalidConfig(_))));

        let reserved = RepositoryConfig::default().first_blob_id(0);
        assert!(matches!(reserved.validate(), Err(StorageError::InvalidConfig(_))));
    }
}
