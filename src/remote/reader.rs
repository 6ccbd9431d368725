//! remote::reader
//!
//! Read remote history back into the abstract model.
//!
//! The parent walk follows the first parent from a tip until it reaches a
//! commit without parents, fetching each commit's message and file content.
//! It is an explicit loop, bounded by a depth limit and checked for
//! revisits, so malformed or very long histories fail instead of hanging.

use std::collections::{HashSet, VecDeque};

use super::RemoteError;
use crate::core::state::{Commit, ReferenceState};
use crate::core::types::{BranchName, Sha};
use crate::forge::{CommitDetails, Forge, ForgeError};

/// Longest history the default walk will follow.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 1024;

/// Full history ending at `sha`, oldest first, root commit included.
pub async fn fetch_reference_commits_from_sha(
    forge: &dyn Forge,
    sha: &Sha,
) -> Result<ReferenceState, RemoteError> {
    fetch_reference_commits_from_sha_bounded(forge, sha, DEFAULT_MAX_CHAIN_DEPTH).await
}

/// Like [`fetch_reference_commits_from_sha`] with an explicit depth limit.
pub async fn fetch_reference_commits_from_sha_bounded(
    forge: &dyn Forge,
    sha: &Sha,
    limit: usize,
) -> Result<ReferenceState, RemoteError> {
    let mut commits = VecDeque::new();
    let mut seen = HashSet::new();
    let mut next = Some(sha.clone());

    while let Some(current) = next {
        if !seen.insert(current.clone()) {
            return Err(RemoteError::ParentCycle { sha: current });
        }
        if commits.len() == limit {
            return Err(RemoteError::ChainTooLong {
                sha: sha.clone(),
                limit,
            });
        }

        let (content, details) = futures::try_join!(
            forge.fetch_content(current.as_str()),
            forge.fetch_commit(&current),
        )?;
        tracing::debug!(sha = %current, parents = details.parents.len(), "fetched commit");

        commits.push_front(Commit::from_content(&content, details.message.as_str()));
        next = details.first_parent().cloned();
    }

    Ok(commits.into_iter().collect())
}

/// Full history of a branch, oldest first, root commit included.
pub async fn fetch_reference_commits(
    forge: &dyn Forge,
    name: &BranchName,
) -> Result<ReferenceState, RemoteError> {
    let sha = forge.fetch_reference_sha(name).await?;
    tracing::debug!(reference = %name, %sha, "resolved reference");
    fetch_reference_commits_from_sha(forge, &sha).await
}

/// All commits of a pull request, across pages, in the order the API lists them.
pub async fn fetch_commits_details(
    forge: &dyn Forge,
    number: u64,
) -> Result<Vec<CommitDetails>, ForgeError> {
    let mut commits = Vec::new();
    let mut page = 1;
    loop {
        let batch = forge.list_pr_commits(number, page).await?;
        tracing::debug!(number, page, count = batch.commits.len(), "fetched pull request commits");
        commits.extend(batch.commits);
        match batch.next_page {
            Some(next) if next > page => page = next,
            Some(next) => {
                return Err(ForgeError::InvalidResponse(format!(
                    "pagination went from page {page} to {next}"
                )))
            }
            None => break,
        }
    }
    Ok(commits)
}

/// SHAs of every commit of a pull request.
pub async fn fetch_commits(forge: &dyn Forge, number: u64) -> Result<Vec<Sha>, ForgeError> {
    Ok(fetch_commits_details(forge, number)
        .await?
        .into_iter()
        .map(|details| details.sha)
        .collect())
}
