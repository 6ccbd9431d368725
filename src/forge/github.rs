//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! This module implements the `Forge` trait for GitHub with the Git data
//! endpoints (`git/blobs`, `git/trees`, `git/commits`, `git/refs`), the
//! contents endpoint for reading the tracked file back, and the pulls
//! endpoints for pull request creation and commit listing.
//!
//! # Authentication
//!
//! A static token is sent as a bearer token on every request. Minting or
//! refreshing tokens is the caller's concern.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Does not implement automatic retry (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use repostate::forge::github::GitHubForge;
//! use repostate::forge::Forge;
//!
//! let forge = GitHubForge::new(token, "owner", "repo");
//! let sha = forge.fetch_reference_sha(&BranchName::new("master")?).await?;
//! ```

use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use async_trait::async_trait;

use super::traits::{
    CommitDetails, CommitPage, CreateCommitRequest, CreatePrRequest, Forge, ForgeError,
    PullRequest,
};
use crate::core::naming::{fully_qualified_ref, head_ref};
use crate::core::state::FILENAME;
use crate::core::types::{BranchName, Sha};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "repostate";

/// GitHub's maximum page size.
const PER_PAGE: u32 = 100;

/// File mode of a regular, non-executable file.
const REGULAR_FILE_MODE: &str = "100644";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token
    token: String,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a GitHub forge for `owner/repo` on github.com.
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::with_api_base(token, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a GitHub forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (`https://github.example.com/api/v3`)
    /// or to point at a local mock server.
    pub fn with_api_base(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("token is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Attach headers and send.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ForgeError> {
        request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ForgeError::InvalidResponse(format!("failed to parse response: {}", e))
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle a response whose body is irrelevant.
    async fn handle_empty_response(&self, response: Response) -> Result<(), ForgeError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        // GitHub Apps report missing fine-grained permissions in this header.
        let required_permissions = response
            .headers()
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => match required_permissions {
                Some(perms) => {
                    ForgeError::AuthFailed(format!("Permission denied: {message} [required: {perms}]"))
                }
                None => ForgeError::AuthFailed(format!("Permission denied: {message}")),
            },
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn create_blob(&self, content: &str) -> Result<Sha, ForgeError> {
        tracing::debug!(bytes = content.len(), "creating blob");
        let body = CreateBlobBody {
            content,
            encoding: "utf-8",
        };
        let response = self
            .send(self.client.post(self.repo_url("git/blobs")).json(&body))
            .await?;
        let created: GitHubSha = self.handle_response(response).await?;
        parse_sha(created.sha)
    }

    async fn create_tree(&self, blob: &Sha) -> Result<Sha, ForgeError> {
        tracing::debug!(%blob, "creating tree");
        let body = CreateTreeBody {
            tree: [TreeEntry {
                path: FILENAME,
                mode: REGULAR_FILE_MODE,
                kind: "blob",
                sha: blob.as_str(),
            }],
        };
        let response = self
            .send(self.client.post(self.repo_url("git/trees")).json(&body))
            .await?;
        let created: GitHubSha = self.handle_response(response).await?;
        parse_sha(created.sha)
    }

    async fn create_commit(&self, request: CreateCommitRequest) -> Result<Sha, ForgeError> {
        tracing::debug!(message = %request.message, parent = ?request.parent, "creating commit");
        let parents: Vec<&str> = request.parent.iter().map(Sha::as_str).collect();
        let body = CreateCommitBody {
            message: &request.message,
            tree: request.tree.as_str(),
            parents: &parents,
        };
        let response = self
            .send(self.client.post(self.repo_url("git/commits")).json(&body))
            .await?;
        let created: GitHubSha = self.handle_response(response).await?;
        parse_sha(created.sha)
    }

    async fn create_reference(&self, name: &BranchName, sha: &Sha) -> Result<(), ForgeError> {
        tracing::debug!(reference = %name, %sha, "creating reference");
        let refname = fully_qualified_ref(name);
        let body = CreateRefBody {
            reference: refname.as_str(),
            sha: sha.as_str(),
        };
        let response = self
            .send(self.client.post(self.repo_url("git/refs")).json(&body))
            .await?;
        self.handle_empty_response(response).await
    }

    async fn update_reference(
        &self,
        name: &BranchName,
        sha: &Sha,
        force: bool,
    ) -> Result<(), ForgeError> {
        tracing::debug!(reference = %name, %sha, force, "updating reference");
        let url = self.repo_url(&format!("git/refs/{}", head_ref(name)));
        let body = UpdateRefBody {
            sha: sha.as_str(),
            force,
        };
        let response = self.send(self.client.patch(&url).json(&body)).await?;
        self.handle_empty_response(response).await
    }

    async fn delete_reference(&self, name: &BranchName) -> Result<(), ForgeError> {
        tracing::debug!(reference = %name, "deleting reference");
        let url = self.repo_url(&format!("git/refs/{}", head_ref(name)));
        let response = self.send(self.client.delete(&url)).await?;
        self.handle_empty_response(response).await
    }

    async fn fetch_reference_sha(&self, name: &BranchName) -> Result<Sha, ForgeError> {
        let url = self.repo_url(&format!("git/ref/{}", head_ref(name)));
        let response = self.send(self.client.get(&url)).await?;
        let reference: GitHubRef = self.handle_response(response).await?;
        parse_sha(reference.object.sha)
    }

    async fn fetch_commit(&self, sha: &Sha) -> Result<CommitDetails, ForgeError> {
        let url = self.repo_url(&format!("git/commits/{}", sha));
        let response = self.send(self.client.get(&url)).await?;
        let commit: GitHubGitCommit = self.handle_response(response).await?;
        commit.try_into()
    }

    async fn fetch_content(&self, reference: &str) -> Result<String, ForgeError> {
        let url = self.repo_url(&format!("contents/{}", FILENAME));
        let response = self
            .send(self.client.get(&url).query(&[("ref", reference)]))
            .await?;
        let file: GitHubContent = self.handle_response(response).await?;
        decode_content(&file.content, &file.encoding)
    }

    async fn create_pr(&self, request: CreatePrRequest) -> Result<PullRequest, ForgeError> {
        tracing::debug!(head = %request.head, base = %request.base, "creating pull request");
        let body = CreatePrBody {
            head: request.head.as_str(),
            base: request.base.as_str(),
            title: &request.title,
            body: request.body.as_deref(),
        };
        let response = self
            .send(self.client.post(self.repo_url("pulls")).json(&body))
            .await?;
        let pr: GitHubPullRequest = self.handle_response(response).await?;
        Ok(pr.into())
    }

    async fn list_pr_commits(&self, number: u64, page: u32) -> Result<CommitPage, ForgeError> {
        let url = self.repo_url(&format!("pulls/{}/commits", number));
        let response = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("per_page", PER_PAGE), ("page", page)]),
            )
            .await?;

        // The Link header carries rel="next" on every page but the last.
        let has_next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(has_next_link)
            .unwrap_or(false);

        let items: Vec<GitHubPullCommit> = self.handle_response(response).await?;
        let commits = items
            .into_iter()
            .map(CommitDetails::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(number, page, count = commits.len(), has_next, "fetched commit page");

        Ok(CommitPage {
            commits,
            next_page: has_next.then_some(page + 1),
        })
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'a str,
}

#[derive(Serialize)]
struct CreateTreeBody<'a> {
    tree: [TreeEntry<'a>; 1],
}

#[derive(Serialize)]
struct TreeEntry<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [&'a str],
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    head: &'a str,
    base: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Any response carrying just the created object's SHA.
#[derive(Deserialize)]
struct GitHubSha {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubRef {
    object: GitHubSha,
}

/// `GET git/commits/{sha}` response.
#[derive(Deserialize)]
struct GitHubGitCommit {
    sha: String,
    message: String,
    parents: Vec<GitHubSha>,
}

/// Entry of `GET pulls/{number}/commits`.
#[derive(Deserialize)]
struct GitHubPullCommit {
    sha: String,
    commit: GitHubPullCommitInner,
    parents: Vec<GitHubSha>,
}

#[derive(Deserialize)]
struct GitHubPullCommitInner {
    message: String,
}

/// `GET contents/{path}` response for a file.
#[derive(Deserialize)]
struct GitHubContent {
    content: String,
    encoding: String,
}

/// GitHub PR response format.
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
    head: GitHubBranchRef,
    base: GitHubBranchRef,
    title: String,
}

#[derive(Deserialize)]
struct GitHubBranchRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

impl From<GitHubPullRequest> for PullRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        PullRequest {
            number: pr.number,
            url: pr.html_url,
            head: pr.head.ref_name,
            base: pr.base.ref_name,
            title: pr.title,
        }
    }
}

impl TryFrom<GitHubGitCommit> for CommitDetails {
    type Error = ForgeError;

    fn try_from(commit: GitHubGitCommit) -> Result<Self, Self::Error> {
        Ok(CommitDetails {
            sha: parse_sha(commit.sha)?,
            message: commit.message,
            parents: commit
                .parents
                .into_iter()
                .map(|p| parse_sha(p.sha))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<GitHubPullCommit> for CommitDetails {
    type Error = ForgeError;

    fn try_from(commit: GitHubPullCommit) -> Result<Self, Self::Error> {
        Ok(CommitDetails {
            sha: parse_sha(commit.sha)?,
            message: commit.commit.message,
            parents: commit
                .parents
                .into_iter()
                .map(|p| parse_sha(p.sha))
                .collect::<Result<_, _>>()?,
        })
    }
}

fn parse_sha(raw: String) -> Result<Sha, ForgeError> {
    Sha::new(raw).map_err(|e| ForgeError::InvalidResponse(e.to_string()))
}

/// Decode the `content` field of a contents response.
///
/// GitHub wraps base64 payloads at 60 columns, so whitespace is stripped
/// before decoding.
fn decode_content(content: &str, encoding: &str) -> Result<String, ForgeError> {
    let bytes = match encoding {
        "base64" => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| ForgeError::InvalidResponse(format!("bad base64 content: {e}")))?
        }
        "utf-8" | "utf8" => content.as_bytes().to_vec(),
        other => {
            return Err(ForgeError::InvalidResponse(format!(
                "unsupported content encoding '{other}'"
            )))
        }
    };
    String::from_utf8(bytes)
        .map_err(|_| ForgeError::InvalidResponse(format!("{FILENAME} is not valid UTF-8")))
}

/// Whether a `Link` header advertises a next page.
fn has_next_link(header: &str) -> bool {
    header
        .split(',')
        .any(|part| part.split(';').skip(1).any(|p| p.trim() == r#"rel="next""#))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod decode_content {
        use super::*;

        #[test]
        fn decodes_wrapped_base64() {
            // "a\n\nb" encoded, then wrapped the way GitHub does
            let encoded = "YQoK\nYg==\n";
            assert_eq!(decode_content(encoded, "base64").unwrap(), "a\n\nb");
        }

        #[test]
        fn passes_utf8_through() {
            assert_eq!(decode_content("plain", "utf-8").unwrap(), "plain");
        }

        #[test]
        fn rejects_unknown_encoding() {
            assert!(matches!(
                decode_content("", "none"),
                Err(ForgeError::InvalidResponse(_))
            ));
        }

        #[test]
        fn rejects_invalid_base64() {
            assert!(decode_content("!!!", "base64").is_err());
        }
    }

    mod link_header {
        use super::*;

        #[test]
        fn detects_next() {
            let header = r#"<https://api.github.com/repositories/1/pulls/2/commits?page=2>; rel="next", <https://api.github.com/repositories/1/pulls/2/commits?page=3>; rel="last""#;
            assert!(has_next_link(header));
        }

        #[test]
        fn last_page_has_no_next() {
            let header = r#"<https://api.github.com/repositories/1/pulls/2/commits?page=1>; rel="first", <https://api.github.com/repositories/1/pulls/2/commits?page=2>; rel="prev""#;
            assert!(!has_next_link(header));
        }
    }

    mod github_forge {
        use super::*;

        #[test]
        fn new_creates_forge() {
            let forge = GitHubForge::new("token", "owner", "repo");
            assert_eq!(forge.name(), "github");
            assert_eq!(forge.owner(), "owner");
            assert_eq!(forge.repo(), "repo");
        }

        #[test]
        fn repo_url_format() {
            let forge = GitHubForge::new("token", "owner", "repo");
            assert_eq!(
                forge.repo_url("git/blobs"),
                "https://api.github.com/repos/owner/repo/git/blobs"
            );
        }

        #[test]
        fn with_api_base_trims_trailing_slash() {
            let forge =
                GitHubForge::with_api_base("token", "owner", "repo", "http://127.0.0.1:9000/");
            assert_eq!(
                forge.repo_url("pulls"),
                "http://127.0.0.1:9000/repos/owner/repo/pulls"
            );
        }

        #[test]
        fn debug_redacts_token() {
            let forge = GitHubForge::new("ghp_secret_token", "owner", "repo");
            let debug = format!("{:?}", forge);
            assert!(!debug.contains("ghp_secret_token"));
            assert!(debug.contains("owner"));
        }

        #[test]
        fn headers_reject_invalid_token() {
            let forge = GitHubForge::new("bad\ntoken", "owner", "repo");
            assert!(matches!(forge.headers(), Err(ForgeError::AuthFailed(_))));
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn git_commit_into_details() {
            let commit = GitHubGitCommit {
                sha: "a".repeat(40),
                message: "msg".into(),
                parents: vec![GitHubSha { sha: "b".repeat(40) }],
            };
            let details = CommitDetails::try_from(commit).unwrap();
            assert_eq!(details.message, "msg");
            assert_eq!(details.first_parent().unwrap().as_str(), "b".repeat(40));
        }

        #[test]
        fn invalid_sha_is_invalid_response() {
            let commit = GitHubGitCommit {
                sha: "zzz".into(),
                message: "msg".into(),
                parents: vec![],
            };
            assert!(matches!(
                CommitDetails::try_from(commit),
                Err(ForgeError::InvalidResponse(_))
            ));
        }
    }
}
