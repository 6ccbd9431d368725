//! local::git_cli
//!
//! Thin async driver for the `git` executable.
//!
//! Every invocation runs in one working directory with the user's global
//! and system configuration masked out, so hooks, signing and default
//! branch settings on the host cannot leak into fixtures.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;

use crate::core::state::StateError;
use crate::core::types::TypeError;

#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

/// Errors from local repository operations.
#[derive(Debug, Error)]
pub enum LocalGitError {
    /// The fixture was rejected before anything was created.
    #[error("invalid repository state: {0}")]
    State(#[from] StateError),

    /// `git` could not be started.
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// `git` exited unsuccessfully.
    #[error("git {args} failed ({status}): {stderr}")]
    Failed {
        args: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Reading or writing the working tree failed.
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `git` printed something that is not UTF-8.
    #[error("git {args} printed non-UTF-8 output")]
    InvalidOutput { args: String },

    /// `git log` printed something that is not a SHA.
    #[error("git printed an invalid commit id: {0}")]
    InvalidSha(#[from] TypeError),
}

/// `git` bound to a working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `git <args>` and return its stdout.
    pub async fn run(&self, args: &[&str]) -> Result<String, LocalGitError> {
        let joined = args.join(" ");
        tracing::debug!(args = %joined, dir = %self.dir.display(), "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", NULL_DEVICE)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| LocalGitError::Spawn {
                args: joined.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LocalGitError::Failed {
                args: joined,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| LocalGitError::InvalidOutput { args: joined })
    }
}
