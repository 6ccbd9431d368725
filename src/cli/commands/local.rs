//! cli::commands::local
//!
//! Build a fixture in a temporary git repository and print each branch's
//! commit ids.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::{block_on, load_fixture, print_json};
use crate::cli::Context;
use crate::core::state::RepoState;
use crate::core::types::{BranchName, Sha};
use crate::local::{create_git_repo, get_reference_shas};

#[derive(Debug, Serialize)]
struct LocalOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    branches: BTreeMap<BranchName, Vec<Sha>>,
}

/// Build `fixture` locally.
pub fn local(ctx: &Context, fixture: &Path, keep: bool) -> Result<()> {
    let state = load_fixture(fixture)?;
    let output = block_on(build(&state, keep))??;

    if ctx.json {
        return print_json(&output);
    }
    if let Some(path) = &output.path {
        println!("Kept repository at {}", path.display());
    }
    if !ctx.quiet {
        for (branch, shas) in &output.branches {
            let shas: Vec<&str> = shas.iter().map(Sha::as_str).collect();
            println!("{branch}: {}", shas.join(" "));
        }
    }
    Ok(())
}

async fn build(state: &RepoState, keep: bool) -> Result<LocalOutput> {
    let mut repo = create_git_repo(state)
        .await
        .context("Failed to build local repository")?;

    let mut names: Vec<BranchName> = state.refs_commits.keys().cloned().collect();
    let default = RepoState::default_branch();
    if !names.contains(&default) {
        names.push(default);
        names.sort();
    }

    let mut branches = BTreeMap::new();
    for name in names {
        let shas = get_reference_shas(&mut repo, &name)
            .await
            .with_context(|| format!("Failed to list commits of {name}"))?;
        branches.insert(name, shas);
    }

    let path = keep.then(|| repo.keep());
    Ok(LocalOutput { path, branches })
}
