//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the fixture and configuration it needs
//! 2. Calls into the local or remote layer
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to GitHub or run `git` are async. Dispatch is
//! synchronous; each such command builds a runtime and blocks on it.

mod compare;
mod completion;
mod local;
mod pr_commits;
mod read;
mod remote;

pub use compare::compare;
pub use completion::completion;
pub use local::local;
pub use pr_commits::pr_commits;
pub use read::read;
pub use remote::remote;

use std::future::Future;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::args::Command;
use super::Context;
use crate::core::config::Config;
use crate::core::state::{ReferenceState, RepoState};
use crate::forge::github::GitHubForge;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Local { fixture, keep } => local(ctx, &fixture, keep),
        Command::Remote { fixture, keep } => remote(ctx, &fixture, keep),
        Command::Read { target, sha } => read(ctx, &target, sha),
        Command::PrCommits { number } => pr_commits(ctx, number),
        Command::Compare { fixture } => compare(ctx, &fixture),
        Command::Completion { shell } => completion(shell),
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    Ok(rt.block_on(future))
}

fn load_fixture(path: &Path) -> Result<RepoState> {
    RepoState::load(path).with_context(|| format!("Failed to load fixture {}", path.display()))
}

fn github_forge() -> Result<GitHubForge> {
    let config = Config::load().context("Failed to load configuration")?;
    config
        .github_forge()
        .context("GitHub access is not configured")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_history(history: &ReferenceState) {
    for (i, commit) in history.iter().enumerate() {
        println!("{i:>3}  {}", commit.message.lines().next().unwrap_or_default());
        for line in &commit.lines {
            println!("       | {line}");
        }
    }
}
