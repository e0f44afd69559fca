use std::sync::Arc;

use serde_json::json;
use specmatrix_core::{ComplianceConfig, CorpusHistorySource, DriftDetector, FetchError};
use specmatrix_sources::{GithubConfig, GithubHistorySource};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn commits(prefix: &str, n: usize) -> serde_json::Value {
    json!((0..n)
        .map(|i| json!({ "sha": format!("{prefix}{i}") }))
        .collect::<Vec<_>>())
}

fn source(server: &MockServer) -> GithubHistorySource {
    GithubHistorySource::new(GithubConfig::new(&server.uri()).with_token("test-token")).unwrap()
}

// ── Commit history ──────────────────────────────────────────────────────

#[tokio::test]
async fn history_paginates_until_short_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/TBD54566975/web5-spec/commits"))
        .and(query_param("sha", "main"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits("a", 100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/TBD54566975/web5-spec/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits("b", 3)))
        .expect(1)
        .mount(&server)
        .await;

    let history = source(&server)
        .commit_history("TBD54566975/web5-spec", "main")
        .await
        .unwrap();
    assert_eq!(history.len(), 103);
    assert_eq!(history[0], "a0");
    assert_eq!(history[100], "b0");
}

#[tokio::test]
async fn history_stops_at_page_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/corpus/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits("c", 100)))
        .expect(2)
        .mount(&server)
        .await;

    let source =
        GithubHistorySource::new(GithubConfig::new(&server.uri()).with_max_pages(2)).unwrap();
    let history = source.commit_history("org/corpus", "main").await.unwrap();
    assert_eq!(history.len(), 200);
}

#[tokio::test]
async fn history_error_status_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/corpus/commits"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = source(&server)
        .commit_history("org/corpus", "main")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 403, .. }));
}

// ── Pinned commit ───────────────────────────────────────────────────────

#[tokio::test]
async fn pinned_commit_reads_submodule_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/TBD54566975/web5-kt/contents/web5-spec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "submodule",
            "name": "web5-spec",
            "sha": "abc123",
            "submodule_git_url": "https://github.com/TBD54566975/web5-spec.git"
        })))
        .mount(&server)
        .await;

    let pinned = source(&server)
        .pinned_commit("TBD54566975/web5-kt", "web5-spec")
        .await
        .unwrap();
    assert_eq!(pinned.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn pinned_commit_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/sdk/contents/tbdex"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let pinned = source(&server).pinned_commit("org/sdk", "tbdex").await.unwrap();
    assert_eq!(pinned, None);
}

#[tokio::test]
async fn pinned_commit_on_plain_directory_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/sdk/contents/tbdex"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "type": "file", "sha": "f1" }])),
        )
        .mount(&server)
        .await;

    let pinned = source(&server).pinned_commit("org/sdk", "tbdex").await.unwrap();
    assert_eq!(pinned, None);
}

#[tokio::test]
async fn pinned_commit_on_regular_file_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/sdk/contents/web5-spec"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "type": "file", "sha": "blob9" })),
        )
        .mount(&server)
        .await;

    let pinned = source(&server)
        .pinned_commit("org/sdk", "web5-spec")
        .await
        .unwrap();
    assert_eq!(pinned, None);
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/org/corpus/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = source(&server)
        .commit_history("org/corpus", "main")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

// ── Drift end to end ────────────────────────────────────────────────────

#[tokio::test]
async fn drift_detector_over_github_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/TBD54566975/web5-spec/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "sha": "h0" }, { "sha": "h1" }, { "sha": "h2" }, { "sha": "h3" }, { "sha": "h4" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/TBD54566975/web5-js/contents/web5-spec"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "type": "submodule", "sha": "h2" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/TBD54566975/web5-kt/contents/web5-spec"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = ComplianceConfig::reference().unwrap();
    let sdks: Vec<_> = ["web5-js", "web5-kt"]
        .iter()
        .map(|name| config.sdk(name).unwrap().clone())
        .collect();

    let drift = DriftDetector::new(Arc::new(source(&server)))
        .detect(&sdks, &config.corpora)
        .await;
    assert_eq!(drift["web5-js"].commits_behind(), Some(2));
    assert!(drift["web5-kt"].is_unknown());
}
