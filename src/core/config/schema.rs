//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Config File
//!
//! Located at (in order of precedence):
//! 1. `$REPOSTATE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repostate/config.toml` (or the platform equivalent)
//!
//! # Validation
//!
//! Config values are validated after parsing and after environment
//! overrides are applied.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// File-level configuration.
///
/// # Example
///
/// ```toml
/// [github]
/// owner = "octocat"
/// repo = "fixtures-sandbox"
/// api_base = "https://api.github.com"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Remote repository the harness writes fixtures into.
    pub github: Option<GitHubConfig>,
}

/// Connection settings for the GitHub repository used by remote fixtures.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// Repository owner (user or organization).
    pub owner: Option<String>,

    /// Repository name.
    pub repo: Option<String>,

    /// Access token. Prefer `REPOSTATE_GITHUB_TOKEN` over storing it here.
    pub token: Option<String>,

    /// API base URL, for GitHub Enterprise.
    pub api_base: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("has_token", &self.token.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubConfig {
    /// Effective API base URL.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Validate the configuration values.
    ///
    /// Absent values are fine here; they are only required once a forge is
    /// built from the config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any present value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("owner", &self.owner), ("repo", &self.repo)] {
            if let Some(value) = value {
                if value.trim().is_empty() || value.contains('/') {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.{key} must be a single non-empty path segment, got '{value}'"
                    )));
                }
            }
        }

        if let Some(token) = &self.token {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "github.token cannot be empty".into(),
                ));
            }
        }

        let api_base = self.api_base();
        if !(api_base.starts_with("https://") || api_base.starts_with("http://")) {
            return Err(ConfigError::InvalidValue(format!(
                "github.api_base must be an http(s) URL, got '{api_base}'"
            )));
        }

        Ok(())
    }
}
