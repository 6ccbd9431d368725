//! local
//!
//! Realize abstract repository states with the `git` executable and read
//! them back.
//!
//! # Design
//!
//! A [`LocalRepo`] owns one temporary working tree. Every operation on it
//! takes `&mut LocalRepo`: building checks out branches and rewrites the
//! tracked file, reading checks out each commit in turn, so no two
//! operations may interleave on the same repository.
//!
//! The directory is removed when the `LocalRepo` is dropped, unless
//! [`LocalRepo::keep`] is called.
//!
//! # Example
//!
//! ```no_run
//! use repostate::core::state::{Commit, RepoState};
//! use repostate::core::types::BranchName;
//! use repostate::local::{create_git_repo, get_reference_commits};
//!
//! # tokio_test::block_on(async {
//! let state = RepoState::builder(Commit::new(["initial"], "initial"))
//!     .branch("feature", vec![Commit::new(["initial", "feature"], "feature")])
//!     .build()
//!     .unwrap();
//!
//! let mut repo = create_git_repo(&state).await.unwrap();
//! let feature = BranchName::new("feature").unwrap();
//! let history = get_reference_commits(&mut repo, &feature).await.unwrap();
//! assert_eq!(history.len(), 2);
//! # });
//! ```

pub mod builder;
pub mod git_cli;
pub mod reader;

pub use builder::create_git_repo;
pub use git_cli::{GitCli, LocalGitError};
pub use reader::{get_reference_commits, get_reference_shas};

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::state::FILENAME;

/// A local repository in a temporary directory.
#[derive(Debug)]
pub struct LocalRepo {
    dir: TempDir,
    git: GitCli,
}

impl LocalRepo {
    /// Create an empty temporary directory for a repository.
    pub(crate) fn create() -> Result<Self, LocalGitError> {
        let dir = tempfile::Builder::new()
            .prefix("repostate-")
            .tempdir()
            .map_err(|source| LocalGitError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let git = GitCli::new(dir.path());
        Ok(Self { dir, git })
    }

    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk and return its path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }

    pub(crate) fn git(&self) -> &GitCli {
        &self.git
    }

    fn tracked_file(&self) -> PathBuf {
        self.path().join(FILENAME)
    }

    pub(crate) async fn write_tracked_file(&mut self, content: &str) -> Result<(), LocalGitError> {
        let path = self.tracked_file();
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| LocalGitError::Io { path, source })
    }

    pub(crate) async fn read_tracked_file(&mut self) -> Result<String, LocalGitError> {
        let path = self.tracked_file();
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LocalGitError::Io { path, source })
    }
}
