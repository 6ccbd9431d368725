//! core::naming
//!
//! Reference paths and ephemeral branch names.
//!
//! # Features
//!
//! - Derive the GitHub API reference paths for a short branch name
//! - Generate collision-resistant ephemeral branch names so that concurrent
//!   test runs can share one remote repository

use uuid::Uuid;

use super::types::{BranchName, RefName};

/// Reference path relative to `refs/`, as used by the GitHub refs endpoints.
///
/// # Example
///
/// ```
/// use repostate::core::naming::head_ref;
/// use repostate::core::types::BranchName;
///
/// let branch = BranchName::new("master").unwrap();
/// assert_eq!(head_ref(&branch), "heads/master");
/// ```
pub fn head_ref(name: &BranchName) -> String {
    format!("heads/{}", name.as_str())
}

/// Fully-qualified reference path (`refs/heads/<name>`).
///
/// # Example
///
/// ```
/// use repostate::core::naming::fully_qualified_ref;
/// use repostate::core::types::BranchName;
///
/// let branch = BranchName::new("feature").unwrap();
/// assert_eq!(fully_qualified_ref(&branch).as_str(), "refs/heads/feature");
/// ```
pub fn fully_qualified_ref(name: &BranchName) -> RefName {
    RefName::for_branch(name)
}

/// Generate a globally unique variant of a branch name (`<name>-<uuid>`).
///
/// Uniqueness is probabilistic (UUID v4); no collision check is made
/// against the remote.
///
/// # Example
///
/// ```
/// use repostate::core::naming::generate_unique_ref;
/// use repostate::core::types::BranchName;
///
/// let base = BranchName::new("feature").unwrap();
/// let unique = generate_unique_ref(&base);
/// assert!(unique.as_str().starts_with("feature-"));
/// assert_ne!(unique, generate_unique_ref(&base));
/// ```
pub fn generate_unique_ref(name: &BranchName) -> BranchName {
    name.with_uuid_suffix(Uuid::new_v4())
}
