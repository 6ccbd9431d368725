//! local::reader
//!
//! Read a local branch back into the abstract model by checking out each
//! commit from oldest to newest.

use super::{LocalGitError, LocalRepo};
use crate::core::state::{Commit, ReferenceState};
use crate::core::types::{BranchName, Sha};

/// Abbreviated SHAs of `branch`, oldest first, root commit included.
pub async fn get_reference_shas(
    repo: &mut LocalRepo,
    branch: &BranchName,
) -> Result<Vec<Sha>, LocalGitError> {
    let log = repo
        .git()
        .run(&["log", "--pretty=format:%h", branch.as_str(), "--"])
        .await?;
    let mut shas = log
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Sha::new)
        .collect::<Result<Vec<_>, _>>()?;
    shas.reverse();
    Ok(shas)
}

/// Full history of `branch`, oldest first, root commit included.
///
/// Leaves the working tree detached at the branch tip.
pub async fn get_reference_commits(
    repo: &mut LocalRepo,
    branch: &BranchName,
) -> Result<ReferenceState, LocalGitError> {
    let shas = get_reference_shas(repo, branch).await?;
    let mut commits = Vec::with_capacity(shas.len());
    for sha in &shas {
        repo.git()
            .run(&["checkout", "--quiet", "--detach", sha.as_str()])
            .await?;
        let content = repo.read_tracked_file().await?;
        let message = repo
            .git()
            .run(&["log", "--format=%B", "--max-count", "1"])
            .await?;
        commits.push(Commit::from_content(
            &content,
            message.trim_end_matches('\n'),
        ));
    }
    tracing::debug!(%branch, count = commits.len(), "read local history");
    Ok(commits.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::RepoState;
    use crate::local::create_git_repo;

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[tokio::test]
    async fn shas_are_oldest_first() {
        let state = RepoState::builder(Commit::new(["initial"], "initial"))
            .branch(
                "master",
                vec![
                    Commit::new(["initial", "one"], "one"),
                    Commit::new(["initial", "one", "two"], "two"),
                ],
            )
            .build()
            .unwrap();
        let mut repo = create_git_repo(&state).await.unwrap();

        let shas = get_reference_shas(&mut repo, &branch("master")).await.unwrap();
        assert_eq!(shas.len(), 3);
        let root = repo
            .git()
            .run(&["rev-list", "--max-parents=0", "master"])
            .await
            .unwrap();
        assert!(root.trim().starts_with(shas[0].as_str()));
        assert!(shas.iter().all(Sha::is_abbreviated));
    }

    #[tokio::test]
    async fn commits_match_fixture() {
        let state = RepoState::builder(Commit::new(["initial"], "initial"))
            .branch(
                "feature",
                vec![
                    Commit::new(["initial", "feature"], "feature 1"),
                    Commit::new(["rewritten"], "feature 2\n\nwith a body"),
                ],
            )
            .build()
            .unwrap();
        let mut repo = create_git_repo(&state).await.unwrap();

        let history = get_reference_commits(&mut repo, &branch("feature"))
            .await
            .unwrap();
        assert_eq!(Some(history), state.expected_history(&branch("feature")));
    }

    #[tokio::test]
    async fn unknown_branch_fails() {
        let state = RepoState::builder(Commit::new(["initial"], "initial"))
            .build()
            .unwrap();
        let mut repo = create_git_repo(&state).await.unwrap();
        let err = get_reference_shas(&mut repo, &branch("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalGitError::Failed { .. }));
    }
}
