//! forge::traits
//!
//! Forge trait definition for the hosting API primitives the harness drives.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is a network call.
//! Each method maps to exactly one API request: there is no retry, and every
//! failure is returned to the caller unchanged.
//!
//! # Example
//!
//! ```ignore
//! use repostate::forge::{CreateCommitRequest, Forge, ForgeError};
//!
//! async fn root_commit(forge: &dyn Forge) -> Result<Sha, ForgeError> {
//!     let blob = forge.create_blob("initial").await?;
//!     let tree = forge.create_tree(&blob).await?;
//!     forge
//!         .create_commit(CreateCommitRequest {
//!             message: "initial".to_string(),
//!             tree,
//!             parent: None,
//!         })
//!         .await
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::types::{BranchName, Sha};

/// Errors from forge operations.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The API answered, but not in the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ForgeError {
    /// Whether the error means the addressed object or reference does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }
}

/// Request to create a commit object.
#[derive(Debug, Clone)]
pub struct CreateCommitRequest {
    /// Commit message
    pub message: String,
    /// Tree the commit snapshots
    pub tree: Sha,
    /// Single parent; `None` creates a root commit
    pub parent: Option<Sha>,
}

/// Commit metadata as reported by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitDetails {
    /// Commit SHA
    pub sha: Sha,
    /// Full commit message
    pub message: String,
    /// Parent SHAs, first parent first
    pub parents: Vec<Sha>,
}

impl CommitDetails {
    /// The first parent, if any. Merge commits are never created here.
    pub fn first_parent(&self) -> Option<&Sha> {
        self.parents.first()
    }
}

/// One page of a pull request's commit list.
#[derive(Debug, Clone, Default)]
pub struct CommitPage {
    /// Commits on this page, in the order the forge returned them
    pub commits: Vec<CommitDetails>,
    /// Page to request next; `None` when the forge signals the last page
    pub next_page: Option<u32>,
}

/// Request to create a pull request.
#[derive(Debug, Clone)]
pub struct CreatePrRequest {
    /// Head branch name (the branch with changes)
    pub head: BranchName,
    /// Base branch name (the branch to merge into)
    pub base: BranchName,
    /// PR title
    pub title: String,
    /// PR body/description
    pub body: Option<String>,
}

/// Pull request information returned from the forge.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR URL (web URL for viewing)
    pub url: String,
    /// Head branch name
    pub head: String,
    /// Base branch name
    pub base: String,
    /// PR title
    pub title: String,
}

/// The Forge trait for the hosting API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so branch chains can be realized
/// concurrently against one forge.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Nothing is retried; a
/// duplicate call creates a duplicate object (identical blobs and trees are
/// deduplicated by content addressing).
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    /// Store `content` as a blob.
    async fn create_blob(&self, content: &str) -> Result<Sha, ForgeError>;

    /// Create a tree holding exactly one regular file, the tracked file, pointing at `blob`.
    async fn create_tree(&self, blob: &Sha) -> Result<Sha, ForgeError>;

    /// Create a commit with zero parents or exactly one.
    async fn create_commit(&self, request: CreateCommitRequest) -> Result<Sha, ForgeError>;

    /// Create `refs/heads/<name>` pointing at `sha`.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if the reference already exists
    async fn create_reference(&self, name: &BranchName, sha: &Sha) -> Result<(), ForgeError>;

    /// Move `refs/heads/<name>` to `sha`; `force` allows non-fast-forward moves.
    async fn update_reference(
        &self,
        name: &BranchName,
        sha: &Sha,
        force: bool,
    ) -> Result<(), ForgeError>;

    /// Delete `refs/heads/<name>`.
    async fn delete_reference(&self, name: &BranchName) -> Result<(), ForgeError>;

    /// Resolve `refs/heads/<name>` to the commit it points at.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the reference does not exist
    async fn fetch_reference_sha(&self, name: &BranchName) -> Result<Sha, ForgeError>;

    /// Fetch a commit's message and parents.
    async fn fetch_commit(&self, sha: &Sha) -> Result<CommitDetails, ForgeError>;

    /// Fetch the tracked file's decoded content at a branch name or SHA.
    async fn fetch_content(&self, reference: &str) -> Result<String, ForgeError>;

    /// Open a pull request.
    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError>;

    /// Fetch one page (1-based) of a pull request's commits.
    async fn list_pr_commits(&self, number: u64, page: u32) -> Result<CommitPage, ForgeError>;
}
