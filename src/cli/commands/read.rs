//! cli::commands::read
//!
//! Print a remote history in the abstract model.

use anyhow::{Context as _, Result};

use super::{block_on, github_forge, print_history, print_json};
use crate::cli::Context;
use crate::core::types::{BranchName, Sha};
use crate::remote::{fetch_reference_commits, fetch_reference_commits_from_sha};

/// Read the history ending at a branch, or at a commit with `by_sha`.
pub fn read(ctx: &Context, target: &str, by_sha: bool) -> Result<()> {
    let forge = github_forge()?;

    let history = if by_sha {
        let sha = Sha::new(target)?;
        block_on(fetch_reference_commits_from_sha(&forge, &sha))?
    } else {
        let branch = BranchName::new(target)?;
        block_on(fetch_reference_commits(&forge, &branch))?
    }
    .with_context(|| format!("Failed to read history of {target}"))?;

    if ctx.json {
        print_json(&history)
    } else {
        if !ctx.quiet {
            print_history(&history);
        }
        Ok(())
    }
}
