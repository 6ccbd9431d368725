//! local::builder
//!
//! Realize a `RepoState` in a fresh local repository.
//!
//! Steps run strictly in order on the one working tree:
//! 1. `git init`, with `HEAD` on the default branch and a fixed identity.
//! 2. Commit the initial commit on the default branch.
//! 3. Create every other branch at the initial commit.
//! 4. For each branch, check it out and commit its history on top.

use super::{LocalGitError, LocalRepo};
use crate::core::state::{Commit, RepoState, DEFAULT_BRANCH, FILENAME};

const AUTHOR_NAME: &str = "repostate";
const AUTHOR_EMAIL: &str = "repostate@localhost";

/// Build `state` in a new temporary repository.
///
/// The state is validated first; an invalid fixture creates nothing.
pub async fn create_git_repo(state: &RepoState) -> Result<LocalRepo, LocalGitError> {
    state.validate()?;

    let mut repo = LocalRepo::create()?;
    init(&repo).await?;
    commit(&mut repo, &state.initial_commit).await?;

    for branch in state.refs_commits.keys() {
        if branch.as_str() != DEFAULT_BRANCH {
            repo.git().run(&["checkout", "--quiet", "-b", branch.as_str()]).await?;
        }
    }

    for (branch, commits) in &state.refs_commits {
        repo.git().run(&["checkout", "--quiet", branch.as_str()]).await?;
        for c in commits {
            commit(&mut repo, c).await?;
        }
    }

    tracing::info!(
        path = %repo.path().display(),
        branches = state.refs_commits.len(),
        "realized repository state locally"
    );
    Ok(repo)
}

async fn init(repo: &LocalRepo) -> Result<(), LocalGitError> {
    let git = repo.git();
    git.run(&["init", "--quiet"]).await?;
    let head = format!("refs/heads/{DEFAULT_BRANCH}");
    git.run(&["symbolic-ref", "HEAD", &head]).await?;
    git.run(&["config", "user.name", AUTHOR_NAME]).await?;
    git.run(&["config", "user.email", AUTHOR_EMAIL]).await?;
    git.run(&["config", "commit.gpgsign", "false"]).await?;
    Ok(())
}

async fn commit(repo: &mut LocalRepo, commit: &Commit) -> Result<(), LocalGitError> {
    repo.write_tracked_file(&commit.content()).await?;
    repo.git().run(&["add", FILENAME]).await?;
    // Identical content on consecutive commits is still a commit in the model,
    // and the message is stored byte for byte, as the remote API stores it.
    repo.git()
        .run(&[
            "commit",
            "--quiet",
            "--allow-empty",
            "--cleanup=verbatim",
            "--message",
            &commit.message,
        ])
        .await?;
    Ok(())
}
