//! cli::commands::compare
//!
//! The differential check: build a fixture remotely and locally, read every
//! branch back from both, and compare commit by commit.
//!
//! The remote references are deleted before the local side is built, even
//! when reading them back failed.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use futures::future::try_join_all;
use serde::Serialize;

use super::{block_on, github_forge, load_fixture, print_json};
use crate::cli::Context;
use crate::core::state::{ReferenceState, RepoState};
use crate::core::types::BranchName;
use crate::forge::Forge;
use crate::local::{create_git_repo, get_reference_commits};
use crate::remote::{create_references, fetch_reference_commits, RemoteRepo};

/// Outcome for one branch.
#[derive(Debug, Serialize)]
pub(crate) struct BranchReport {
    pub branch: BranchName,
    pub remote: ReferenceState,
    pub local: ReferenceState,
    pub expected: ReferenceState,
}

impl BranchReport {
    /// Both sides agree with each other and with the fixture.
    pub fn is_equivalent(&self) -> bool {
        self.remote == self.local && self.local == self.expected
    }

    /// Index of the first commit where the remote and local sides differ.
    pub fn first_difference(&self) -> Option<usize> {
        let common = self.remote.len().min(self.local.len());
        (0..common)
            .find(|&i| self.remote[i] != self.local[i])
            .or((self.remote.len() != self.local.len()).then_some(common))
    }
}

pub fn compare(ctx: &Context, fixture: &Path) -> Result<()> {
    let state = load_fixture(fixture)?;
    let forge = github_forge()?;
    let reports = block_on(compare_state(&forge, &state))??;

    if ctx.json {
        print_json(&reports)?;
    } else {
        for report in &reports {
            if report.is_equivalent() {
                if !ctx.quiet {
                    println!("ok    {} ({} commits)", report.branch, report.local.len());
                }
            } else {
                match report.first_difference() {
                    Some(i) => println!("DIFF  {} (first difference at commit {i})", report.branch),
                    None => println!("DIFF  {} (both sides differ from the fixture)", report.branch),
                }
            }
        }
    }

    let mismatched = reports.iter().filter(|r| !r.is_equivalent()).count();
    if mismatched > 0 {
        bail!("{mismatched} of {} branches differ", reports.len());
    }
    Ok(())
}

/// Build `state` both ways and read each branch back from both.
pub(crate) async fn compare_state(forge: &dyn Forge, state: &RepoState) -> Result<Vec<BranchReport>> {
    let mut remote = read_remote(forge, state).await?;
    let mut local = read_local(state).await?;

    Ok(state
        .refs_commits
        .keys()
        .map(|branch| BranchReport {
            branch: branch.clone(),
            remote: remote.remove(branch).unwrap_or_default(),
            local: local.remove(branch).unwrap_or_default(),
            expected: state.expected_history(branch).unwrap_or_default(),
        })
        .collect())
}

async fn read_remote(
    forge: &dyn Forge,
    state: &RepoState,
) -> Result<BTreeMap<BranchName, ReferenceState>> {
    let repo = create_references(forge, state)
        .await
        .context("Failed to build remote state")?;

    let histories = read_remote_histories(forge, &repo).await;
    let cleanup = repo.delete_references().await;

    let histories = histories?;
    cleanup.context("Failed to delete remote references")?;
    Ok(histories)
}

async fn read_remote_histories(
    forge: &dyn Forge,
    repo: &RemoteRepo<'_>,
) -> Result<BTreeMap<BranchName, ReferenceState>> {
    let reads = repo.refs_details().iter().map(|(branch, details)| async move {
        let history = fetch_reference_commits(forge, &details.reference)
            .await
            .with_context(|| format!("Failed to read remote history of {branch}"))?;
        Ok::<_, anyhow::Error>((branch.clone(), history))
    });
    Ok(try_join_all(reads).await?.into_iter().collect())
}

async fn read_local(state: &RepoState) -> Result<BTreeMap<BranchName, ReferenceState>> {
    let mut repo = create_git_repo(state)
        .await
        .context("Failed to build local repository")?;

    let mut histories = BTreeMap::new();
    for branch in state.refs_commits.keys() {
        let history = get_reference_commits(&mut repo, branch)
            .await
            .with_context(|| format!("Failed to read local history of {branch}"))?;
        histories.insert(branch.clone(), history);
    }
    Ok(histories)
}
