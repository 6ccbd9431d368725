//! core::state
//!
//! The abstract repository model that fixtures are written in.
//!
//! # Model
//!
//! - [`Commit`] - the tracked file's lines plus a commit message
//! - [`ReferenceState`] - one branch's commits, oldest first
//! - [`RepoState`] - a shared initial commit plus per-branch histories
//!
//! Every repository realized from a [`RepoState`] tracks exactly one file,
//! [`FILENAME`]. Its content is the commit's lines joined by
//! [`LINE_SEPARATOR`]; [`get_lines`] inverts [`get_content`] exactly for any
//! fixture that passes [`RepoState::validate`].
//!
//! # Example
//!
//! ```
//! use repostate::core::state::{get_content, get_lines, Commit, RepoState};
//!
//! let state = RepoState::builder(Commit::new(["initial"], "initial"))
//!     .branch("master", [Commit::new(["initial", "master 1"], "master 1")])
//!     .branch("feature", [Commit::new(["initial", "feature 1"], "feature 1")])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(state.refs_commits.len(), 2);
//! assert_eq!(get_lines(&get_content(&["a", "b"])), vec!["a", "b"]);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{BranchName, TypeError};

/// The single file tracked in every realized repository.
pub const FILENAME: &str = "file.txt";

/// Branch created by the initial commit.
pub const DEFAULT_BRANCH: &str = "master";

/// Blank line between consecutive entries of [`Commit::lines`].
pub const LINE_SEPARATOR: &str = "\n\n";

/// Errors from fixture validation and loading.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("commit message cannot be empty")]
    EmptyMessage,

    #[error("commit message {message:?} has leading or trailing whitespace")]
    UntrimmedMessage { message: String },

    #[error("commit {message:?} has no lines")]
    EmptyLines { message: String },

    #[error("line {line:?} of commit {message:?} cannot be encoded")]
    UnencodableLine { message: String, line: String },

    #[error(transparent)]
    InvalidBranch(#[from] TypeError),

    #[error("failed to read fixture '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse fixture '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Serialize lines into the tracked file's content.
pub fn get_content<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut content = String::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            content.push_str(LINE_SEPARATOR);
        }
        content.push_str(line.as_ref());
    }
    content
}

/// Split the tracked file's content back into lines.
pub fn get_lines(content: &str) -> Vec<String> {
    content.split(LINE_SEPARATOR).map(str::to_string).collect()
}

/// One commit of the abstract model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commit {
    /// Logical content of [`FILENAME`].
    pub lines: Vec<String>,
    /// Commit message; never empty.
    pub message: String,
}

impl Commit {
    /// Create a commit from its lines and message.
    pub fn new<I, S>(lines: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Rebuild a commit from the tracked file's content and a message.
    pub fn from_content(content: &str, message: impl Into<String>) -> Self {
        Self {
            lines: get_lines(content),
            message: message.into(),
        }
    }

    /// The tracked file's content for this commit.
    pub fn content(&self) -> String {
        get_content(&self.lines)
    }

    /// Check that this commit survives a round trip through both git and GitHub.
    ///
    /// Messages are committed verbatim, but reading back with `%B` drops
    /// trailing newlines, so surrounding whitespace is rejected. Lines that
    /// touch the separator would split differently on read.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.message.is_empty() {
            return Err(StateError::EmptyMessage);
        }
        if self.message.trim() != self.message {
            return Err(StateError::UntrimmedMessage {
                message: self.message.clone(),
            });
        }
        if self.lines.is_empty() {
            return Err(StateError::EmptyLines {
                message: self.message.clone(),
            });
        }
        for line in &self.lines {
            if line.contains(LINE_SEPARATOR) || line.starts_with('\n') || line.ends_with('\n') {
                return Err(StateError::UnencodableLine {
                    message: self.message.clone(),
                    line: line.clone(),
                });
            }
        }
        Ok(())
    }
}

/// One branch's history, oldest first.
///
/// In a [`RepoState`], index 0 is the child of the initial commit. The
/// readers return the whole chain, so there index 0 is the root commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceState(Vec<Commit>);

impl ReferenceState {
    /// Create a history from commits listed oldest first.
    pub fn new(commits: Vec<Commit>) -> Self {
        Self(commits)
    }

    /// Consume into the underlying commits.
    pub fn into_commits(self) -> Vec<Commit> {
        self.0
    }
}

impl std::ops::Deref for ReferenceState {
    type Target = [Commit];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Commit>> for ReferenceState {
    fn from(commits: Vec<Commit>) -> Self {
        Self(commits)
    }
}

impl FromIterator<Commit> for ReferenceState {
    fn from_iter<I: IntoIterator<Item = Commit>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ReferenceState {
    type Item = Commit;
    type IntoIter = std::vec::IntoIter<Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReferenceState {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An abstract repository: a shared root commit and linear branch histories.
///
/// # Fixture format
///
/// ```toml
/// [initial_commit]
/// lines = ["initial"]
/// message = "initial"
///
/// [[refs_commits.master]]
/// lines = ["initial", "master 1"]
/// message = "master 1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoState {
    /// Root commit shared by every branch.
    pub initial_commit: Commit,
    /// Commits on top of the initial commit, per branch.
    #[serde(default)]
    pub refs_commits: BTreeMap<BranchName, ReferenceState>,
}

impl RepoState {
    /// Start building a state on top of `initial_commit`.
    pub fn builder(initial_commit: Commit) -> RepoStateBuilder {
        RepoStateBuilder {
            initial_commit,
            branches: Vec::new(),
        }
    }

    /// The branch the initial commit lands on.
    pub fn default_branch() -> BranchName {
        BranchName::default_branch()
    }

    /// Validate every commit of the fixture.
    pub fn validate(&self) -> Result<(), StateError> {
        self.initial_commit.validate()?;
        self.refs_commits
            .values()
            .flat_map(|history| history.iter())
            .try_for_each(Commit::validate)
    }

    /// Full oldest-first history of `branch` once realized, root included.
    ///
    /// A branch that is not listed only holds the initial commit when it is
    /// the default branch; otherwise it does not exist.
    pub fn expected_history(&self, branch: &BranchName) -> Option<ReferenceState> {
        let tail = match self.refs_commits.get(branch) {
            Some(history) => history.iter().cloned().collect(),
            None if branch.as_str() == DEFAULT_BRANCH => Vec::new(),
            None => return None,
        };
        Some(
            std::iter::once(self.initial_commit.clone())
                .chain(tail)
                .collect(),
        )
    }

    /// Load and validate a fixture file (TOML, or JSON for `.json`).
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let text = std::fs::read_to_string(path).map_err(|source| StateError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let state: RepoState = if is_json {
            serde_json::from_str(&text).map_err(|e| StateError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&text).map_err(|e| StateError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        state.validate()?;
        Ok(state)
    }
}

/// Builder for [`RepoState`] literals in tests.
#[derive(Debug)]
pub struct RepoStateBuilder {
    initial_commit: Commit,
    branches: Vec<(String, Vec<Commit>)>,
}

impl RepoStateBuilder {
    /// Add a branch with its commits, oldest first.
    pub fn branch(
        mut self,
        name: impl Into<String>,
        commits: impl IntoIterator<Item = Commit>,
    ) -> Self {
        self.branches
            .push((name.into(), commits.into_iter().collect()));
        self
    }

    /// Validate names and commits, producing the state.
    pub fn build(self) -> Result<RepoState, StateError> {
        let mut refs_commits = BTreeMap::new();
        for (name, commits) in self.branches {
            refs_commits.insert(BranchName::new(name)?, ReferenceState::new(commits));
        }
        let state = RepoState {
            initial_commit: self.initial_commit,
            refs_commits,
        };
        state.validate()?;
        Ok(state)
    }
}
