//! Integration tests for the GitHub REST client.
//!
//! Requests go to a local `wiremock` server; these tests pin down request
//! shapes, response decoding, pagination and error mapping.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use repostate::core::types::{BranchName, Sha};
use repostate::forge::github::GitHubForge;
use repostate::forge::{CreateCommitRequest, CreatePrRequest, Forge, ForgeError};
use repostate::remote::{fetch_commits, fetch_reference_commits};

const OWNER: &str = "octo";
const REPO: &str = "sandbox";

fn sha(c: char) -> String {
    c.to_string().repeat(40)
}

fn branch(name: &str) -> BranchName {
    BranchName::new(name).unwrap()
}

async fn setup() -> (MockServer, GitHubForge) {
    let server = MockServer::start().await;
    let forge = GitHubForge::with_api_base("test-token", OWNER, REPO, server.uri());
    (server, forge)
}

fn repo_path(rest: &str) -> String {
    format!("/repos/{OWNER}/{REPO}/{rest}")
}

// =============================================================================
// Git data primitives
// =============================================================================

mod primitives {
    use super::*;

    #[tokio::test]
    async fn create_blob_sends_utf8_content_with_auth() {
        let (server, forge) = setup().await;
        Mock::given(method("POST"))
            .and(path(repo_path("git/blobs")))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-github-api-version", "2022-11-28"))
            .and(body_json(json!({ "content": "a\n\nb", "encoding": "utf-8" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('a') })))
            .expect(1)
            .mount(&server)
            .await;

        let blob = forge.create_blob("a\n\nb").await.unwrap();
        assert_eq!(blob.as_str(), sha('a'));
    }

    #[tokio::test]
    async fn create_tree_holds_single_regular_file() {
        let (server, forge) = setup().await;
        Mock::given(method("POST"))
            .and(path(repo_path("git/trees")))
            .and(body_json(json!({
                "tree": [{ "path": "file.txt", "mode": "100644", "type": "blob", "sha": sha('a') }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('b') })))
            .expect(1)
            .mount(&server)
            .await;

        let tree = forge.create_tree(&Sha::new(sha('a')).unwrap()).await.unwrap();
        assert_eq!(tree.as_str(), sha('b'));
    }

    #[tokio::test]
    async fn root_commit_has_no_parents() {
        let (server, forge) = setup().await;
        Mock::given(method("POST"))
            .and(path(repo_path("git/commits")))
            .and(body_json(json!({ "message": "initial", "tree": sha('b'), "parents": [] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('c') })))
            .expect(1)
            .mount(&server)
            .await;

        let commit = forge
            .create_commit(CreateCommitRequest {
                message: "initial".into(),
                tree: Sha::new(sha('b')).unwrap(),
                parent: None,
            })
            .await
            .unwrap();
        assert_eq!(commit.as_str(), sha('c'));
    }

    #[tokio::test]
    async fn child_commit_has_one_parent() {
        let (server, forge) = setup().await;
        Mock::given(method("POST"))
            .and(path(repo_path("git/commits")))
            .and(body_json(json!({ "message": "child", "tree": sha('b'), "parents": [sha('c')] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('d') })))
            .expect(1)
            .mount(&server)
            .await;

        forge
            .create_commit(CreateCommitRequest {
                message: "child".into(),
                tree: Sha::new(sha('b')).unwrap(),
                parent: Some(Sha::new(sha('c')).unwrap()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_reference_uses_fully_qualified_name() {
        let (server, forge) = setup().await;
        Mock::given(method("POST"))
            .and(path(repo_path("git/refs")))
            .and(body_json(json!({ "ref": "refs/heads/feature-1", "sha": sha('d') })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "ref": "refs/heads/feature-1",
                "object": { "sha": sha('d') }
            })))
            .expect(1)
            .mount(&server)
            .await;

        forge
            .create_reference(&branch("feature-1"), &Sha::new(sha('d')).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_reference_sends_force_flag() {
        let (server, forge) = setup().await;
        Mock::given(method("PATCH"))
            .and(path(repo_path("git/refs/heads/feature")))
            .and(body_json(json!({ "sha": sha('e'), "force": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        forge
            .update_reference(&branch("feature"), &Sha::new(sha('e')).unwrap(), true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_reference_uses_short_name() {
        let (server, forge) = setup().await;
        Mock::given(method("DELETE"))
            .and(path(repo_path("git/refs/heads/feature/nested")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        forge.delete_reference(&branch("feature/nested")).await.unwrap();
    }

    #[tokio::test]
    async fn fetch_reference_sha_reads_object() {
        let (server, forge) = setup().await;
        Mock::given(method("GET"))
            .and(path(repo_path("git/ref/heads/master")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/master",
                "object": { "sha": sha('f'), "type": "commit" }
            })))
            .mount(&server)
            .await;

        let tip = forge.fetch_reference_sha(&branch("master")).await.unwrap();
        assert_eq!(tip.as_str(), sha('f'));
    }
}

// =============================================================================
// Reads
// =============================================================================

mod reads {
    use super::*;

    fn commit_body(own: char, message: &str, parents: &[char]) -> serde_json::Value {
        json!({
            "sha": sha(own),
            "message": message,
            "parents": parents.iter().map(|p| json!({ "sha": sha(*p) })).collect::<Vec<_>>(),
        })
    }

    async fn mount_commit(server: &MockServer, own: char, message: &str, parents: &[char], b64: &str) {
        Mock::given(method("GET"))
            .and(path(repo_path(&format!("git/commits/{}", sha(own)))))
            .respond_with(ResponseTemplate::new(200).set_body_json(commit_body(own, message, parents)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(repo_path("contents/file.txt")))
            .and(query_param("ref", sha(own)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "content": b64, "encoding": "base64" })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_content_decodes_wrapped_base64() {
        let (server, forge) = setup().await;
        Mock::given(method("GET"))
            .and(path(repo_path("contents/file.txt")))
            .and(query_param("ref", "feature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "content": "YQoK\nYg==\n",
                "encoding": "base64"
            })))
            .mount(&server)
            .await;

        assert_eq!(forge.fetch_content("feature").await.unwrap(), "a\n\nb");
    }

    #[tokio::test]
    async fn fetch_commit_maps_parents() {
        let (server, forge) = setup().await;
        mount_commit(&server, 'b', "child", &['a'], "").await;

        let details = forge.fetch_commit(&Sha::new(sha('b')).unwrap()).await.unwrap();
        assert_eq!(details.message, "child");
        assert_eq!(details.parents, vec![Sha::new(sha('a')).unwrap()]);
    }

    #[tokio::test]
    async fn reference_history_walks_to_root() {
        let (server, forge) = setup().await;
        Mock::given(method("GET"))
            .and(path(repo_path("git/ref/heads/feature")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": sha('b') } })),
            )
            .mount(&server)
            .await;
        // "initial" and "initial\n\nfeature"
        mount_commit(&server, 'a', "initial", &[], "aW5pdGlhbA==").await;
        mount_commit(&server, 'b', "feature 1", &['a'], "aW5pdGlhbAoKZmVhdHVyZQ==").await;

        let history = fetch_reference_commits(&forge, &branch("feature")).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].lines, vec!["initial"]);
        assert_eq!(history[0].message, "initial");
        assert_eq!(history[1].lines, vec!["initial", "feature"]);
        assert_eq!(history[1].message, "feature 1");
    }

    #[tokio::test]
    async fn pull_request_commits_follow_link_header() {
        let (server, forge) = setup().await;
        let entry = |c: char| {
            json!({ "sha": sha(c), "commit": { "message": format!("commit {c}") }, "parents": [] })
        };
        let next = format!(
            "<{}{}?per_page=100&page=2>; rel=\"next\", <{}{}?per_page=100&page=2>; rel=\"last\"",
            server.uri(),
            repo_path("pulls/7/commits"),
            server.uri(),
            repo_path("pulls/7/commits"),
        );

        Mock::given(method("GET"))
            .and(path(repo_path("pulls/7/commits")))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(json!([entry('a'), entry('b')])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(repo_path("pulls/7/commits")))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry('c')])))
            .expect(1)
            .mount(&server)
            .await;

        let shas = fetch_commits(&forge, 7).await.unwrap();
        let shas: Vec<&str> = shas.iter().map(Sha::as_str).collect();
        assert_eq!(shas, vec![sha('a'), sha('b'), sha('c')]);
    }

    #[tokio::test]
    async fn create_pr_maps_response() {
        let (server, forge) = setup().await;
        Mock::given(method("POST"))
            .and(path(repo_path("pulls")))
            .and(body_json(json!({ "head": "feature", "base": "master", "title": "Feature" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 12,
                "html_url": "https://github.com/octo/sandbox/pull/12",
                "head": { "ref": "feature" },
                "base": { "ref": "master" },
                "title": "Feature"
            })))
            .mount(&server)
            .await;

        let pr = forge
            .create_pr(CreatePrRequest {
                head: branch("feature"),
                base: branch("master"),
                title: "Feature".into(),
                body: None,
            })
            .await
            .unwrap();
        assert_eq!(pr.number, 12);
        assert_eq!(pr.head, "feature");
        assert_eq!(pr.base, "master");
    }
}

// =============================================================================
// Error mapping
// =============================================================================

mod errors {
    use super::*;

    async fn fetch_with_status(template: ResponseTemplate) -> ForgeError {
        let (server, forge) = setup().await;
        Mock::given(method("GET"))
            .and(path(repo_path("git/ref/heads/master")))
            .respond_with(template)
            .mount(&server)
            .await;
        forge.fetch_reference_sha(&branch("master")).await.unwrap_err()
    }

    fn message(text: &str) -> serde_json::Value {
        json!({ "message": text })
    }

    #[tokio::test]
    async fn not_found() {
        let err = fetch_with_status(ResponseTemplate::new(404).set_body_json(message("Not Found"))).await;
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unauthorized() {
        let err = fetch_with_status(ResponseTemplate::new(401).set_body_json(message("Bad credentials"))).await;
        assert!(matches!(err, ForgeError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn forbidden_reports_required_permissions() {
        let err = fetch_with_status(
            ResponseTemplate::new(403)
                .insert_header("X-Accepted-GitHub-Permissions", "contents=write")
                .set_body_json(message("Resource not accessible by integration")),
        )
        .await;
        match err {
            ForgeError::AuthFailed(text) => assert!(text.contains("contents=write")),
            other => panic!("expected AuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unprocessable() {
        let err = fetch_with_status(
            ResponseTemplate::new(422).set_body_json(message("Reference already exists")),
        )
        .await;
        assert!(
            matches!(err, ForgeError::ApiError { status: 422, ref message } if message == "Reference already exists")
        );
    }

    #[tokio::test]
    async fn rate_limited() {
        let err = fetch_with_status(ResponseTemplate::new(429)).await;
        assert!(matches!(err, ForgeError::RateLimited));
    }

    #[tokio::test]
    async fn server_error() {
        let err = fetch_with_status(ResponseTemplate::new(502)).await;
        assert!(matches!(err, ForgeError::ApiError { status: 502, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let err = fetch_with_status(ResponseTemplate::new(200).set_body_string("not json")).await;
        assert!(matches!(err, ForgeError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let forge = GitHubForge::with_api_base("t", OWNER, REPO, "http://127.0.0.1:9");
        let err = forge.fetch_reference_sha(&branch("master")).await.unwrap_err();
        assert!(matches!(err, ForgeError::NetworkError(_)));
    }
}
