//! remote
//!
//! Realize abstract repository states on a forge and read them back.
//!
//! # Modules
//!
//! - [`lifecycle`] - Ephemeral references: scoped and explicit release
//! - [`builder`] - `RepoState` to a commit chain and ephemeral ref per branch
//! - [`reader`] - Parent-chain walk back to a `ReferenceState`, PR commit pagination
//!
//! # Concurrency
//!
//! Commits within one branch are created strictly in order, since each
//! needs its parent's SHA. Different branches only share the immutable
//! initial commit and are realized concurrently on the same task.

pub mod builder;
pub mod lifecycle;
pub mod reader;

pub use builder::{create_commit_from_state, create_references, RefDetails, RemoteRepo};
pub use lifecycle::{create_temporary_reference, with_temporary_reference, TemporaryReference};
pub use reader::{
    fetch_commits, fetch_commits_details, fetch_reference_commits,
    fetch_reference_commits_from_sha, fetch_reference_commits_from_sha_bounded,
    DEFAULT_MAX_CHAIN_DEPTH,
};

use thiserror::Error;

use crate::core::state::StateError;
use crate::core::types::Sha;
use crate::forge::ForgeError;

/// Errors from remote construction and reading.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A forge call failed.
    #[error(transparent)]
    Forge(#[from] ForgeError),

    /// The fixture was rejected before anything was created.
    #[error("invalid repository state: {0}")]
    State(#[from] StateError),

    /// The parent walk exceeded its depth limit.
    #[error("history of {sha} is longer than {limit} commits")]
    ChainTooLong { sha: Sha, limit: usize },

    /// The parent walk reached a commit it had already visited.
    #[error("parent chain revisits commit {sha}")]
    ParentCycle { sha: Sha },
}

impl RemoteError {
    /// Whether the underlying forge error is a not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Forge(e) if e.is_not_found())
    }
}
