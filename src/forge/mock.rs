//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge is an in-memory, content-addressed object store behind
//! the `Forge` trait. Object ids are derived from object content with
//! SHA-256 (truncated to 20 bytes), so identical blobs and trees
//! deduplicate the way they do on GitHub. It mirrors the GitHub status
//! codes the harness cares about (404 for missing refs and objects, 422 for
//! invalid writes), records every call, and can be told to fail.
//!
//! # Example
//!
//! ```
//! use repostate::core::types::BranchName;
//! use repostate::forge::mock::MockForge;
//! use repostate::forge::{CreateCommitRequest, Forge};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//!
//! let blob = forge.create_blob("initial").await.unwrap();
//! let tree = forge.create_tree(&blob).await.unwrap();
//! let sha = forge
//!     .create_commit(CreateCommitRequest {
//!         message: "initial".to_string(),
//!         tree,
//!         parent: None,
//!     })
//!     .await
//!     .unwrap();
//!
//! let master = BranchName::new("master").unwrap();
//! forge.create_reference(&master, &sha).await.unwrap();
//! assert_eq!(forge.fetch_reference_sha(&master).await.unwrap(), sha);
//! assert_eq!(forge.fetch_content("master").await.unwrap(), "initial");
//! # });
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::traits::{
    CommitDetails, CommitPage, CreateCommitRequest, CreatePrRequest, Forge, ForgeError,
    PullRequest,
};
use crate::core::types::{BranchName, Sha};

/// Page size GitHub uses for `pulls/{number}/commits`.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[derive(Debug)]
struct MockForgeInner {
    blobs: HashMap<Sha, String>,
    /// Tree id to the blob of its single file.
    trees: HashMap<Sha, Sha>,
    commits: HashMap<Sha, StoredCommit>,
    refs: BTreeMap<BranchName, Sha>,
    prs: BTreeMap<u64, StoredPr>,
    next_pr_number: u64,
    page_size: usize,
    fail_on: Vec<FailOn>,
    operations: Vec<MockOperation>,
}

#[derive(Debug, Clone)]
struct StoredCommit {
    message: String,
    tree: Sha,
    parents: Vec<Sha>,
}

#[derive(Debug, Clone)]
struct StoredPr {
    pr: PullRequest,
    /// Oldest first.
    commits: Vec<Sha>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail create_commit for commits with this message.
    CreateCommit { message: String, error: ForgeError },
    /// Fail every create_reference.
    CreateReference(ForgeError),
    /// Fail delete_reference for this reference.
    DeleteReference { name: BranchName, error: ForgeError },
    /// Fail every fetch_commit.
    FetchCommit(ForgeError),
    /// Fail list_pr_commits for this page.
    ListPrCommits { page: u32, error: ForgeError },
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CreateBlob { content: String },
    CreateTree { blob: Sha },
    CreateCommit { message: String, parent: Option<Sha> },
    CreateReference { name: BranchName, sha: Sha },
    UpdateReference { name: BranchName, sha: Sha, force: bool },
    DeleteReference { name: BranchName },
    FetchReferenceSha { name: BranchName },
    FetchCommit { sha: Sha },
    FetchContent { reference: String },
    CreatePr { head: BranchName, base: BranchName },
    ListPrCommits { number: u64, page: u32 },
}

/// Content address of an object: SHA-256 over kind and fields, first 20 bytes.
fn object_id(kind: &str, fields: &[&str]) -> Sha {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    for field in fields {
        hasher.update([0u8]);
        hasher.update(field.as_bytes());
    }
    let digest = hasher.finalize();
    let mut id = [0u8; 20];
    id.copy_from_slice(&digest[..20]);
    Sha::from_digest(&id)
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                blobs: HashMap::new(),
                trees: HashMap::new(),
                commits: HashMap::new(),
                refs: BTreeMap::new(),
                prs: BTreeMap::new(),
                next_pr_number: 1,
                page_size: DEFAULT_PAGE_SIZE,
                fail_on: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// Use a smaller page size for pull request commit listings.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state().page_size = page_size.max(1);
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use repostate::forge::mock::{FailOn, MockForge};
    /// use repostate::forge::ForgeError;
    ///
    /// let forge = MockForge::new().fail_on(FailOn::CreateReference(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on.push(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Names of all existing references.
    pub fn reference_names(&self) -> Vec<BranchName> {
        self.state().refs.keys().cloned().collect()
    }

    /// Number of stored commit objects.
    pub fn commit_count(&self) -> usize {
        self.state().commits.len()
    }

    /// Store a commit under a caller-chosen id, bypassing content addressing.
    ///
    /// Lets tests build histories real hosts cannot produce, such as parent cycles.
    pub fn insert_commit(&self, sha: Sha, message: &str, parents: Vec<Sha>, content: &str) {
        let mut inner = self.state();
        let blob = object_id("blob", &[content]);
        let tree = object_id("tree", &[blob.as_str()]);
        inner.blobs.insert(blob.clone(), content.to_string());
        inner.trees.insert(tree.clone(), blob);
        inner.commits.insert(
            sha,
            StoredCommit {
                message: message.to_string(),
                tree,
                parents,
            },
        );
    }

    /// Point a reference at a commit without going through the API.
    pub fn set_reference(&self, name: BranchName, sha: Sha) {
        self.state().refs.insert(name, sha);
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockForgeInner {
    fn record(&mut self, operation: MockOperation) {
        self.operations.push(operation);
    }

    fn injected_failure(&self, matches: impl Fn(&FailOn) -> Option<ForgeError>) -> Result<(), ForgeError> {
        match self.fail_on.iter().find_map(matches) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn commit(&self, sha: &Sha) -> Result<&StoredCommit, ForgeError> {
        self.commits
            .get(sha)
            .ok_or_else(|| ForgeError::NotFound(format!("commit {sha}")))
    }

    /// First-parent chain from `sha`, newest first, stopping on revisits.
    fn first_parent_chain(&self, sha: &Sha) -> Vec<Sha> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(sha.clone());
        while let Some(sha) = current {
            if !seen.insert(sha.clone()) {
                break;
            }
            current = self
                .commits
                .get(&sha)
                .and_then(|c| c.parents.first().cloned());
            chain.push(sha);
        }
        chain
    }

    /// Resolve a branch name or commit SHA.
    fn resolve(&self, reference: &str) -> Option<Sha> {
        if let Ok(name) = BranchName::new(reference) {
            if let Some(sha) = self.refs.get(&name) {
                return Some(sha.clone());
            }
        }
        Sha::new(reference)
            .ok()
            .filter(|sha| self.commits.contains_key(sha))
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_blob(&self, content: &str) -> Result<Sha, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::CreateBlob {
            content: content.to_string(),
        });
        let sha = object_id("blob", &[content]);
        inner.blobs.insert(sha.clone(), content.to_string());
        Ok(sha)
    }

    async fn create_tree(&self, blob: &Sha) -> Result<Sha, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::CreateTree { blob: blob.clone() });
        if !inner.blobs.contains_key(blob) {
            return Err(unprocessable(format!("blob {blob} does not exist")));
        }
        let sha = object_id("tree", &[blob.as_str()]);
        inner.trees.insert(sha.clone(), blob.clone());
        Ok(sha)
    }

    async fn create_commit(&self, request: CreateCommitRequest) -> Result<Sha, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::CreateCommit {
            message: request.message.clone(),
            parent: request.parent.clone(),
        });
        inner.injected_failure(|f| match f {
            FailOn::CreateCommit { message, error } if *message == request.message => {
                Some(error.clone())
            }
            _ => None,
        })?;

        if !inner.trees.contains_key(&request.tree) {
            return Err(unprocessable(format!("tree {} does not exist", request.tree)));
        }
        if let Some(parent) = &request.parent {
            if !inner.commits.contains_key(parent) {
                return Err(unprocessable(format!("parent {parent} does not exist")));
            }
        }

        let parent = request.parent.as_ref().map(Sha::as_str).unwrap_or("");
        let sha = object_id("commit", &[request.tree.as_str(), parent, &request.message]);
        inner.commits.insert(
            sha.clone(),
            StoredCommit {
                message: request.message,
                tree: request.tree,
                parents: request.parent.into_iter().collect(),
            },
        );
        Ok(sha)
    }

    async fn create_reference(&self, name: &BranchName, sha: &Sha) -> Result<(), ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::CreateReference {
            name: name.clone(),
            sha: sha.clone(),
        });
        inner.injected_failure(|f| match f {
            FailOn::CreateReference(error) => Some(error.clone()),
            _ => None,
        })?;

        if inner.refs.contains_key(name) {
            return Err(unprocessable("Reference already exists"));
        }
        if !inner.commits.contains_key(sha) {
            return Err(unprocessable("Object does not exist"));
        }
        inner.refs.insert(name.clone(), sha.clone());
        Ok(())
    }

    async fn update_reference(
        &self,
        name: &BranchName,
        sha: &Sha,
        force: bool,
    ) -> Result<(), ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::UpdateReference {
            name: name.clone(),
            sha: sha.clone(),
            force,
        });

        let current = inner
            .refs
            .get(name)
            .cloned()
            .ok_or_else(|| unprocessable("Reference does not exist"))?;
        if !inner.commits.contains_key(sha) {
            return Err(unprocessable("Object does not exist"));
        }
        if !force && !inner.first_parent_chain(sha).contains(&current) {
            return Err(unprocessable("Update is not a fast forward"));
        }
        inner.refs.insert(name.clone(), sha.clone());
        Ok(())
    }

    async fn delete_reference(&self, name: &BranchName) -> Result<(), ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::DeleteReference { name: name.clone() });
        inner.injected_failure(|f| match f {
            FailOn::DeleteReference { name: target, error } if target == name => {
                Some(error.clone())
            }
            _ => None,
        })?;

        match inner.refs.remove(name) {
            Some(_) => Ok(()),
            None => Err(unprocessable("Reference does not exist")),
        }
    }

    async fn fetch_reference_sha(&self, name: &BranchName) -> Result<Sha, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::FetchReferenceSha { name: name.clone() });
        inner
            .refs
            .get(name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("heads/{name}")))
    }

    async fn fetch_commit(&self, sha: &Sha) -> Result<CommitDetails, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::FetchCommit { sha: sha.clone() });
        inner.injected_failure(|f| match f {
            FailOn::FetchCommit(error) => Some(error.clone()),
            _ => None,
        })?;

        let commit = inner.commit(sha)?;
        Ok(CommitDetails {
            sha: sha.clone(),
            message: commit.message.clone(),
            parents: commit.parents.clone(),
        })
    }

    async fn fetch_content(&self, reference: &str) -> Result<String, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::FetchContent {
            reference: reference.to_string(),
        });

        let sha = inner
            .resolve(reference)
            .ok_or_else(|| ForgeError::NotFound(format!("No commit found for the ref {reference}")))?;
        let tree = &inner.commit(&sha)?.tree;
        inner
            .trees
            .get(tree)
            .and_then(|blob| inner.blobs.get(blob))
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("tree {tree}")))
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::CreatePr {
            head: request.head.clone(),
            base: request.base.clone(),
        });

        let head = inner
            .refs
            .get(&request.head)
            .cloned()
            .ok_or_else(|| unprocessable(format!("head {} does not exist", request.head)))?;
        let base = inner
            .refs
            .get(&request.base)
            .cloned()
            .ok_or_else(|| unprocessable(format!("base {} does not exist", request.base)))?;

        let base_chain: HashSet<Sha> = inner.first_parent_chain(&base).into_iter().collect();
        let mut commits: Vec<Sha> = inner
            .first_parent_chain(&head)
            .into_iter()
            .take_while(|sha| !base_chain.contains(sha))
            .collect();
        if commits.is_empty() {
            return Err(unprocessable(format!(
                "No commits between {} and {}",
                request.base, request.head
            )));
        }
        commits.reverse();

        let number = inner.next_pr_number;
        inner.next_pr_number += 1;
        let pr = PullRequest {
            number,
            url: format!("https://github.com/mock/mock/pull/{number}"),
            head: request.head.to_string(),
            base: request.base.to_string(),
            title: request.title,
        };
        inner.prs.insert(
            number,
            StoredPr {
                pr: pr.clone(),
                commits,
            },
        );
        Ok(pr)
    }

    async fn list_pr_commits(&self, number: u64, page: u32) -> Result<CommitPage, ForgeError> {
        let mut inner = self.state();
        inner.record(MockOperation::ListPrCommits { number, page });
        inner.injected_failure(|f| match f {
            FailOn::ListPrCommits { page: p, error } if *p == page => Some(error.clone()),
            _ => None,
        })?;

        let stored = inner
            .prs
            .get(&number)
            .ok_or_else(|| ForgeError::NotFound(format!("pull request #{number}")))?;
        let start = (page.max(1) as usize - 1) * inner.page_size;
        let end = (start + inner.page_size).min(stored.commits.len());
        let shas = stored.commits.get(start..end).unwrap_or_default();

        let commits = shas
            .iter()
            .map(|sha| {
                let commit = inner.commit(sha)?;
                Ok(CommitDetails {
                    sha: sha.clone(),
                    message: commit.message.clone(),
                    parents: commit.parents.clone(),
                })
            })
            .collect::<Result<Vec<_>, ForgeError>>()?;

        Ok(CommitPage {
            commits,
            next_page: (end < stored.commits.len()).then_some(page.max(1) + 1),
        })
    }
}
