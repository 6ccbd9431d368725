//! remote::builder
//!
//! Realize a `RepoState` on a forge.
//!
//! # Design
//!
//! Every commit is built bottom-up from Git primitives: a blob with the
//! encoded lines, a single-entry tree holding it as `file.txt`, then a
//! commit pointing at the tree and at most one parent. The initial commit
//! is created once and shared; each branch then grows its own chain on top
//! of it and gets one ephemeral reference at its tip.
//!
//! Branches run concurrently. When one fails, the others still run to
//! completion and the first error is returned. References that were
//! created before the failure are not removed; they are logged so they can
//! be cleaned up by hand.

use std::collections::BTreeMap;

use futures::future::join_all;
use serde::Serialize;

use super::lifecycle::TemporaryReference;
use super::RemoteError;
use crate::core::state::{Commit, ReferenceState, RepoState};
use crate::core::types::{BranchName, Sha};
use crate::forge::{CreateCommitRequest, Forge, ForgeError};

/// Where one branch of the fixture ended up on the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefDetails {
    /// Ephemeral reference name, `<branch>-<uuid>`.
    #[serde(rename = "ref")]
    pub reference: BranchName,
    /// Full chain, oldest first: the initial commit, then one SHA per
    /// fixture commit. The last entry is the reference tip.
    pub shas: Vec<Sha>,
}

/// A realized fixture and the handle to tear it down.
pub struct RemoteRepo<'a> {
    forge: &'a dyn Forge,
    initial_sha: Sha,
    refs_details: BTreeMap<BranchName, RefDetails>,
}

impl std::fmt::Debug for RemoteRepo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRepo")
            .field("forge", &self.forge.name())
            .field("initial_sha", &self.initial_sha)
            .field("refs_details", &self.refs_details)
            .finish()
    }
}

impl<'a> RemoteRepo<'a> {
    /// Per-branch details, keyed by the fixture's branch name.
    pub fn refs_details(&self) -> &BTreeMap<BranchName, RefDetails> {
        &self.refs_details
    }

    /// SHA of the shared initial commit.
    pub fn initial_sha(&self) -> &Sha {
        &self.initial_sha
    }

    /// Ephemeral reference created for a fixture branch.
    pub fn ref_for(&self, branch: &BranchName) -> Option<&BranchName> {
        self.refs_details.get(branch).map(|d| &d.reference)
    }

    /// Delete every ephemeral reference this fixture created.
    ///
    /// Deletions run concurrently; all are attempted and the first error
    /// is returned.
    pub async fn delete_references(&self) -> Result<(), ForgeError> {
        let results = join_all(
            self.refs_details
                .values()
                .map(|details| self.forge.delete_reference(&details.reference)),
        )
        .await;

        let mut first_error = None;
        for (details, result) in self.refs_details.values().zip(results) {
            match result {
                Ok(()) => {
                    tracing::debug!(reference = %details.reference, "deleted reference")
                }
                Err(e) => {
                    tracing::warn!(reference = %details.reference, error = %e, "failed to delete reference");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drop the teardown handle, returning only the details.
    pub fn into_refs_details(self) -> BTreeMap<BranchName, RefDetails> {
        self.refs_details
    }
}

/// Create blob, tree and commit for one abstract commit.
pub async fn create_commit_from_state(
    forge: &dyn Forge,
    commit: &Commit,
    parent: Option<&Sha>,
) -> Result<Sha, ForgeError> {
    let blob = forge.create_blob(&commit.content()).await?;
    let tree = forge.create_tree(&blob).await?;
    let sha = forge
        .create_commit(CreateCommitRequest {
            message: commit.message.clone(),
            tree,
            parent: parent.cloned(),
        })
        .await?;
    tracing::debug!(%sha, message = %commit.message, "created commit");
    Ok(sha)
}

async fn create_branch(
    forge: &dyn Forge,
    branch: &BranchName,
    commits: &ReferenceState,
    initial: &Sha,
) -> Result<RefDetails, ForgeError> {
    let mut shas = Vec::with_capacity(commits.len() + 1);
    shas.push(initial.clone());
    for commit in commits {
        let parent = shas.last().cloned();
        let sha = create_commit_from_state(forge, commit, parent.as_ref()).await?;
        shas.push(sha);
    }

    let tip = shas.last().unwrap_or(initial);
    let reference = TemporaryReference::create(forge, branch, tip)
        .await?
        .into_name();
    Ok(RefDetails { reference, shas })
}

/// Realize `state` on the forge.
///
/// The state is validated first; an invalid fixture creates nothing.
pub async fn create_references<'a>(
    forge: &'a dyn Forge,
    state: &RepoState,
) -> Result<RemoteRepo<'a>, RemoteError> {
    state.validate()?;

    let initial_sha = create_commit_from_state(forge, &state.initial_commit, None).await?;
    tracing::debug!(sha = %initial_sha, "created initial commit");

    let results = join_all(
        state
            .refs_commits
            .iter()
            .map(|(branch, commits)| create_branch(forge, branch, commits, &initial_sha)),
    )
    .await;

    let mut refs_details = BTreeMap::new();
    let mut first_error = None;
    for (branch, result) in state.refs_commits.keys().zip(results) {
        match result {
            Ok(details) => {
                refs_details.insert(branch.clone(), details);
            }
            Err(e) => {
                tracing::debug!(%branch, error = %e, "failed to create branch");
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(error) = first_error {
        if !refs_details.is_empty() {
            let leaked: Vec<&str> = refs_details
                .values()
                .map(|d| d.reference.as_str())
                .collect();
            tracing::warn!(
                references = ?leaked,
                "remote state creation failed; created references were left in place"
            );
        }
        return Err(error.into());
    }

    tracing::info!(
        forge = forge.name(),
        branches = refs_details.len(),
        "realized repository state remotely"
    );
    Ok(RemoteRepo {
        forge,
        initial_sha,
        refs_details,
    })
}
