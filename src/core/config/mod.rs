//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables
//! 4. CLI flags (not handled here)
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. `$REPOSTATE_CONFIG` if set
//! 2. `<config dir>/repostate/config.toml`
//!
//! # Environment
//!
//! - `REPOSTATE_GITHUB_TOKEN` (falls back to `GITHUB_TOKEN`)
//! - `REPOSTATE_GITHUB_OWNER`
//! - `REPOSTATE_GITHUB_REPO`
//! - `REPOSTATE_GITHUB_API_BASE`
//!
//! # Example
//!
//! ```no_run
//! use repostate::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let forge = config.github_forge().unwrap();
//! ```

pub mod schema;

pub use schema::{FileConfig, GitHubConfig, DEFAULT_API_BASE};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::forge::github::GitHubForge;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "REPOSTATE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing required config value '{key}' (set {env})")]
    Missing {
        key: &'static str,
        env: &'static str,
    },
}

/// Resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// GitHub connection settings after overrides.
    pub github: GitHubConfig,
    /// Path of the config file that was loaded, if any.
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default file location and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// the resolved values are invalid. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let path = Self::locate(&env);
        Self::load_from(path.as_deref(), &env)
    }

    /// Load from an explicit file (if any) and a given environment.
    pub fn load_from(
        path: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => Self::read_file(p)?,
            None => FileConfig::default(),
        };

        let mut github = file.github.unwrap_or_default();
        apply_env(&mut github, env);

        let config = Self {
            github,
            path: path.map(Path::to_path_buf),
        };
        config.validate()?;
        tracing::debug!(github = ?config.github, path = ?config.path, "loaded configuration");
        Ok(config)
    }

    /// Check resolved values: non-empty owner and repo, http(s) API base.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.github.validate()
    }

    /// Path of the config file that contributed values.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Build a GitHub forge for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if token, owner, or repo is unset.
    pub fn github_forge(&self) -> Result<GitHubForge, ConfigError> {
        let token = self.github.token.clone().ok_or(ConfigError::Missing {
            key: "github.token",
            env: "REPOSTATE_GITHUB_TOKEN",
        })?;
        let owner = self.github.owner.clone().ok_or(ConfigError::Missing {
            key: "github.owner",
            env: "REPOSTATE_GITHUB_OWNER",
        })?;
        let repo = self.github.repo.clone().ok_or(ConfigError::Missing {
            key: "github.repo",
            env: "REPOSTATE_GITHUB_REPO",
        })?;
        Ok(GitHubForge::with_api_base(
            token,
            owner,
            repo,
            self.github.api_base(),
        ))
    }

    /// Find the config file: `$REPOSTATE_CONFIG`, else the per-user config dir.
    fn locate(env: &HashMap<String, String>) -> Option<PathBuf> {
        if let Some(explicit) = env.get(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }
        dirs::config_dir()
            .map(|dir| dir.join("repostate").join("config.toml"))
            .filter(|p| p.exists())
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Overlay environment variables onto file values.
fn apply_env(github: &mut GitHubConfig, env: &HashMap<String, String>) {
    let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

    if let Some(token) = get("REPOSTATE_GITHUB_TOKEN").or_else(|| get("GITHUB_TOKEN")) {
        github.token = Some(token);
    }
    if let Some(owner) = get("REPOSTATE_GITHUB_OWNER") {
        github.owner = Some(owner);
    }
    if let Some(repo) = get("REPOSTATE_GITHUB_REPO") {
        github.repo = Some(repo);
    }
    if let Some(api_base) = get("REPOSTATE_GITHUB_API_BASE") {
        github.api_base = Some(api_base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::Forge;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = Config::load_from(None, &HashMap::new()).unwrap();
        assert_eq!(config.github.api_base(), DEFAULT_API_BASE);
        assert!(config.github.owner.is_none());
        assert!(config.path().is_none());
    }

    #[test]
    fn file_values_are_loaded() {
        let (_dir, path) = write_config("[github]\nowner = \"octocat\"\nrepo = \"sandbox\"\n");
        let config = Config::load_from(Some(&path), &HashMap::new()).unwrap();
        assert_eq!(config.github.owner.as_deref(), Some("octocat"));
        assert_eq!(config.github.repo.as_deref(), Some("sandbox"));
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn env_overrides_file() {
        let (_dir, path) = write_config("[github]\nowner = \"from-file\"\n");
        let config = Config::load_from(
            Some(&path),
            &env(&[("REPOSTATE_GITHUB_OWNER", "from-env")]),
        )
        .unwrap();
        assert_eq!(config.github.owner.as_deref(), Some("from-env"));
    }

    #[test]
    fn token_falls_back_to_github_token() {
        let config = Config::load_from(None, &env(&[("GITHUB_TOKEN", "ghp_fallback")])).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_fallback"));

        let config = Config::load_from(
            None,
            &env(&[
                ("GITHUB_TOKEN", "ghp_fallback"),
                ("REPOSTATE_GITHUB_TOKEN", "ghp_specific"),
            ]),
        )
        .unwrap();
        assert_eq!(config.github.token.as_deref(), Some("ghp_specific"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let (_dir, path) = write_config("[github]\nrepo = \"sandbox\"\n");
        let config =
            Config::load_from(Some(&path), &env(&[("REPOSTATE_GITHUB_REPO", "")])).unwrap();
        assert_eq!(config.github.repo.as_deref(), Some("sandbox"));
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let result = Config::load_from(Some(Path::new("/nonexistent/config.toml")), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let (_dir, path) = write_config("[github\n");
        let result = Config::load_from(Some(&path), &HashMap::new());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let result = Config::load_from(
            None,
            &env(&[("REPOSTATE_GITHUB_API_BASE", "not-a-url")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn locate_prefers_explicit_env() {
        let located = Config::locate(&env(&[(CONFIG_ENV, "/tmp/custom.toml")]));
        assert_eq!(located, Some(PathBuf::from("/tmp/custom.toml")));
    }

    #[test]
    fn github_forge_requires_all_values() {
        let config = Config::load_from(
            None,
            &env(&[("REPOSTATE_GITHUB_OWNER", "octocat"), ("REPOSTATE_GITHUB_REPO", "sandbox")]),
        )
        .unwrap();
        assert!(matches!(
            config.github_forge(),
            Err(ConfigError::Missing { key: "github.token", .. })
        ));
    }

    #[test]
    fn github_forge_uses_configured_repository() {
        let config = Config::load_from(
            None,
            &env(&[
                ("REPOSTATE_GITHUB_TOKEN", "ghp_token"),
                ("REPOSTATE_GITHUB_OWNER", "octocat"),
                ("REPOSTATE_GITHUB_REPO", "sandbox"),
            ]),
        )
        .unwrap();
        let forge = config.github_forge().unwrap();
        assert_eq!(forge.name(), "github");
        assert_eq!(forge.owner(), "octocat");
        assert_eq!(forge.repo(), "sandbox");
    }
}
