//! cli::commands::pr_commits
//!
//! List every commit of a pull request across pages.

use anyhow::{Context as _, Result};

use super::{block_on, github_forge, print_json};
use crate::cli::Context;
use crate::remote::fetch_commits_details;

pub fn pr_commits(ctx: &Context, number: u64) -> Result<()> {
    let forge = github_forge()?;
    let commits = block_on(fetch_commits_details(&forge, number))?
        .with_context(|| format!("Failed to list commits of pull request #{number}"))?;

    if ctx.json {
        return print_json(&commits);
    }
    for commit in &commits {
        if ctx.quiet {
            println!("{}", commit.sha);
        } else {
            let subject = commit.message.lines().next().unwrap_or_default();
            println!("{} {subject}", commit.sha.short(7));
        }
    }
    Ok(())
}
