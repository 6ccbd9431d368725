//! core::types
//!
//! Strong types for the identifiers the harness passes around.
//!
//! # Types
//!
//! - [`BranchName`] - Validated short branch name (`master`, `feature-<uuid>`)
//! - [`RefName`] - Fully-qualified reference path (`refs/heads/<name>`)
//! - [`Sha`] - Opaque object identifier handed out by GitHub or local git
//!
//! # Validation
//!
//! These types enforce validity at construction time. A [`Sha`] is never
//! computed by the harness; it only wraps what a version-control system
//! returned, so validation is limited to its textual shape.
//!
//! # Examples
//!
//! ```
//! use repostate::core::types::{BranchName, RefName, Sha};
//!
//! let branch = BranchName::new("feature").unwrap();
//! assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/feature");
//!
//! let sha = Sha::new("3A0F9c1").unwrap();
//! assert_eq!(sha.as_str(), "3a0f9c1");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Sha::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid sha: {0}")]
    InvalidSha(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Characters git refuses anywhere in a reference name.
const INVALID_REF_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Shared refname checks (see `git check-ref-format`).
fn check_ref_format(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cannot be empty".into());
    }
    if name == "@" {
        return Err("cannot be '@' (reserved)".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("cannot start or end with '/'".into());
    }
    if name.ends_with(".lock") {
        return Err("cannot end with '.lock'".into());
    }
    for forbidden in ["..", "@{", "//"] {
        if name.contains(forbidden) {
            return Err(format!("cannot contain '{forbidden}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| INVALID_REF_CHARS.contains(c)) {
        return Err(format!("cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("cannot contain control characters".into());
    }
    if name
        .split('/')
        .any(|component| component.starts_with('.') || component.ends_with(".lock"))
    {
        return Err("path component cannot start with '.' or end with '.lock'".into());
    }
    Ok(())
}

/// A validated short branch name.
///
/// This is the name a fixture uses as a key in `refs_commits` and the name
/// handed to `git checkout`. It is distinct from its [`RefName`] and from
/// the ephemeral variant produced by
/// [`generate_unique_ref`](crate::core::naming::generate_unique_ref).
///
/// # Example
///
/// ```
/// use repostate::core::types::BranchName;
///
/// let name = BranchName::new("feature/nested").unwrap();
/// assert_eq!(name.as_str(), "feature/nested");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-leading-dash").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        // A leading dash would be parsed as an option by `git checkout`.
        if name.starts_with('-') || name.starts_with('.') {
            return Err(TypeError::InvalidBranchName(format!(
                "'{name}' cannot start with '-' or '.'"
            )));
        }
        check_ref_format(&name)
            .map_err(|reason| TypeError::InvalidBranchName(format!("'{name}' {reason}")))?;
        Ok(Self(name))
    }

    /// The branch a fresh repository's first commit lands on.
    pub fn default_branch() -> Self {
        Self(super::state::DEFAULT_BRANCH.to_string())
    }

    /// Append `-<uuid>` to the name.
    pub fn with_uuid_suffix(&self, id: uuid::Uuid) -> Self {
        // A hyphenated UUID only adds `[0-9a-f-]`, so the result stays valid.
        Self(format!("{}-{}", self.0, id.hyphenated()))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, fully-qualified Git reference name.
///
/// # Example
///
/// ```
/// use repostate::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("master").unwrap();
/// let refname = RefName::for_branch(&branch);
/// assert_eq!(refname.as_str(), "refs/heads/master");
/// assert_eq!(refname.strip_prefix("refs/"), Some("heads/master"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name is not under `refs/`
    /// or violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if !name.starts_with("refs/") {
            return Err(TypeError::InvalidRefName(format!(
                "'{name}' must start with 'refs/'"
            )));
        }
        check_ref_format(&name)
            .map_err(|reason| TypeError::InvalidRefName(format!("'{name}' {reason}")))?;
        Ok(Self(name))
    }

    /// Create a ref name for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        // Branch names are validated and the prefix is valid.
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Check if this ref is a branch ref.
    pub fn is_branch_ref(&self) -> bool {
        self.0.starts_with("refs/heads/")
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An object identifier returned by GitHub or by local git.
///
/// Normalized to lowercase. Both full (40 or 64 characters) and abbreviated
/// forms are accepted, since `git log --pretty=format:%h` prints short SHAs.
///
/// # Example
///
/// ```
/// use repostate::core::types::Sha;
///
/// let full = Sha::new("abc123def4567890abc123def4567890abc12345").unwrap();
/// assert!(!full.is_abbreviated());
/// assert_eq!(full.short(7), "abc123d");
///
/// let short = Sha::new("abc123d").unwrap();
/// assert!(short.is_abbreviated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha(String);

impl Sha {
    /// Shortest abbreviation git will print.
    const MIN_LEN: usize = 4;
    /// SHA-256 object ids are the longest supported.
    const MAX_LEN: usize = 64;

    /// Create a new validated SHA.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSha` if the string is not 4 to 64 hex characters.
    pub fn new(sha: impl Into<String>) -> Result<Self, TypeError> {
        let sha = sha.into().to_ascii_lowercase();
        if sha.len() < Self::MIN_LEN || sha.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidSha(format!(
                "expected {} to {} hex characters, got {}",
                Self::MIN_LEN,
                Self::MAX_LEN,
                sha.len()
            )));
        }
        if !sha.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidSha(format!(
                "'{sha}' is not hexadecimal"
            )));
        }
        Ok(Self(sha))
    }

    /// Hex-encode a 20-byte object id.
    pub fn from_digest(bytes: &[u8; 20]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Whether this is an abbreviated object id.
    pub fn is_abbreviated(&self) -> bool {
        self.0.len() != 40 && self.0.len() != 64
    }

    /// Get an abbreviated form of the SHA.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Sha> for String {
    fn from(sha: Sha) -> Self {
        sha.0
    }
}

impl AsRef<str> for Sha {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
