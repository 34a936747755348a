//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the hosting API and drive the
//! coordinator and its workers end-to-end.

use serde_json::json;
use snippet_harvest::config::Config;
use snippet_harvest::crawler::{Coordinator, CredentialQueue, RunOutcome};
use snippet_harvest::state::{Ledger, SharedState};
use snippet_harvest::storage::SnippetStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RAW: &str = "application/vnd.github.raw+json";

const MAIN_PY: &str = r#""""Entry point."""


def add(a, b):
    """Adds two numbers."""
    return a + b


def undocumented():
    return None
"#;

const UTIL_PY: &str = r#"class Point:
    """A point in the plane."""

    def norm(self):
        """Distance from the origin."""
        return 0
"#;

/// Creates a test configuration pointing at the mock server
fn create_test_config(api_url: &str, workers: usize) -> Config {
    let mut config = Config::default();
    config.github.api_url = api_url.to_string();
    config.crawler.workers = workers;
    config.crawler.poll_interval_ms = 10;
    config.crawler.shutdown_grace_ms = 2_000;
    config
}

fn open_shared(dir: &Path) -> Arc<SharedState> {
    let ledger = Ledger::load(dir.join("ids.json")).unwrap();
    let store = SnippetStore::new(&dir.join("snippets.db")).unwrap();
    Arc::new(SharedState::new(ledger, store))
}

fn tokens(n: usize) -> CredentialQueue {
    CredentialQueue::new((1..=n).map(|i| format!("token-{}", i)).collect(), 0).unwrap()
}

fn repository(id: u64, name: &str, server: &MockServer) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("octo/{}", name),
        "html_url": format!("{}/octo/{}", server.uri(), name),
        "default_branch": "main",
        "stargazers_count": 3
    })
}

async fn mount_search(server: &MockServer, items: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": items.len(),
            "incomplete_results": false,
            "items": items,
        })))
        .mount(server)
        .await;
}

fn snippet_rows(db: &Path) -> Vec<(String, String, String)> {
    let conn = rusqlite::Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare("SELECT title, code, source FROM snippets ORDER BY id")
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    rows
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_crawl_single_repository() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, vec![repository(1, "tool", &server)]).await;

    // Root listing, fetched exactly once even with two workers
    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/contents"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "src", "type": "dir"},
            {"path": ".github", "type": "dir"},
            {"path": "setup.py", "type": "file"},
            {"path": "main.py", "type": "file"},
            {"path": "README.md", "type": "file"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/contents/src"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "src/util.py", "type": "file"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // Hidden directories and packaging scripts are never requested
    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/contents/.github"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/contents/setup.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string("print('setup')"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/contents/main.py"))
        .and(header("accept", RAW))
        .respond_with(ResponseTemplate::new(200).set_body_string(MAIN_PY))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/tool/contents/src/util.py"))
        .and(header("accept", RAW))
        .respond_with(ResponseTemplate::new(200).set_body_string(UTIL_PY))
        .expect(1)
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 2);

    let outcome = Coordinator::new(config, Arc::clone(&shared), tokens(1))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(shared.visited_count().unwrap(), 1);
    assert_eq!(shared.in_flight_count().unwrap(), 0);

    let ledger = Ledger::load(dir.path().join("ids.json")).unwrap();
    assert_eq!(ledger.ids(), vec![1]);

    // add: 2 rows; norm: 2 rows; Point: 2 rows plus the whole file
    let rows = snippet_rows(&dir.path().join("snippets.db"));
    assert_eq!(rows.len(), 7);

    let source = format!("{}/octo/tool", server.uri());
    assert!(rows.iter().all(|(_, _, s)| *s == source));
    assert!(rows
        .iter()
        .all(|(_, code, _)| code.starts_with("<code>\n") && code.ends_with("\n</code>")));

    let add = rows
        .iter()
        .find(|(title, _, _)| title == "Adds two numbers.")
        .unwrap();
    assert_eq!(add.1, "<code>\ndef add(a, b):\n    return a + b\n</code>");

    let whole_file = rows
        .iter()
        .find(|(_, code, _)| *code == format!("<code>\n{}\n</code>", UTIL_PY))
        .unwrap();
    assert_eq!(whole_file.0, "A point in the plane.");
}

#[tokio::test]
async fn test_visited_repository_is_skipped_before_any_call() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ids.json"), "[7]").unwrap();

    mount_search(&server, vec![repository(7, "seen", &server)]).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/seen/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 1);

    let outcome = Coordinator::new(config, Arc::clone(&shared), tokens(1))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(shared.snippet_count().unwrap(), 0);
    assert_eq!(shared.visited_count().unwrap(), 1);
}

#[tokio::test]
async fn test_quota_exhaustion_rotates_to_next_credential() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_json(json!({"message": "API rate limit exceeded"})),
        )
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 2);

    let outcome = Coordinator::new(config, shared, tokens(2))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    match outcome {
        RunOutcome::Rotate(next) => {
            assert_eq!(next.current(), "token-2");
            assert_eq!(next.remaining(), 1);
            assert_eq!(next.position(), 2);
        }
        other => panic!("expected rotation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_quota_on_last_credential_exhausts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 1);

    let outcome = Coordinator::new(config, shared, tokens(1))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::CredentialsExhausted);
}

#[tokio::test]
async fn test_quota_mid_repository_leaves_it_unrecorded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, vec![repository(3, "big", &server)]).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/big/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "a.py", "type": "file"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/big/contents/a.py"))
        .respond_with(ResponseTemplate::new(403).insert_header("retry-after", "60"))
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 1);

    let outcome = Coordinator::new(config, Arc::clone(&shared), tokens(2))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Rotate(_)));
    assert!(!shared.is_visited(3).unwrap());
    assert_eq!(shared.in_flight_count().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_file_is_skipped_and_repository_completes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, vec![repository(5, "gaps", &server)]).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/gaps/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "gone.py", "type": "file"},
            {"path": "broken.py", "type": "file"},
            {"path": "ok.py", "type": "file"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/gaps/contents/gone.py"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/gaps/contents/broken.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string("def broken(:\n    \"\"\"Doc.\"\"\"\n"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/gaps/contents/ok.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "def ok():\n    \"\"\"Works.\"\"\"\n    return True\n",
        ))
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 1);

    let outcome = Coordinator::new(config, Arc::clone(&shared), tokens(1))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(shared.is_visited(5).unwrap());
    assert_eq!(shared.snippet_count().unwrap(), 2);
}

#[tokio::test]
async fn test_undecodable_and_python2_files_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_search(&server, vec![repository(6, "legacy", &server)]).await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/legacy/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "latin1.py", "type": "file"},
            {"path": "py2.py", "type": "file"},
            {"path": "ok.py", "type": "file"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/legacy/contents/latin1.py"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"def caf():\n    \"\"\"Caf\xe9.\"\"\"\n    return 1\n".to_vec()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/legacy/contents/py2.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "def legacy():\n    \"\"\"Old code.\"\"\"\n    print \"hello\"\n",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/legacy/contents/ok.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "def ok():\n    \"\"\"Works.\"\"\"\n    return True\n",
        ))
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 1);

    let outcome = Coordinator::new(config, Arc::clone(&shared), tokens(1))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(shared.is_visited(6).unwrap());

    let rows = snippet_rows(&dir.path().join("snippets.db"));
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|(_, code, _)| !code.contains("legacy") && !code.contains("caf")));
}

#[tokio::test]
async fn test_cancellation_stops_before_any_call() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 0,
            "items": []
        })))
        .expect(0)
        .mount(&server)
        .await;

    let shared = open_shared(dir.path());
    let config = create_test_config(&server.uri(), 3);

    let coordinator =
        Coordinator::new(config, shared, tokens(2)).without_interrupt_handler();
    coordinator.cancel_flag().cancel();

    let outcome = coordinator.run().await.unwrap();
    assert_eq!(outcome, RunOutcome::Interrupted);
}

#[tokio::test]
async fn test_unreachable_api_rotates() {
    let dir = TempDir::new().unwrap();
    let shared = open_shared(dir.path());
    // Nothing listens on port 1
    let config = create_test_config("http://127.0.0.1:1", 1);

    let outcome = Coordinator::new(config, shared, tokens(2))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Rotate(_)));
}

#[tokio::test]
async fn test_pagination_walks_every_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "items": [repository(10, "a", &server), repository(11, "b", &server)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "items": [repository(12, "c", &server)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    for name in ["a", "b", "c"] {
        Mock::given(method("GET"))
            .and(path(format!("/repos/octo/{}/contents", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let shared = open_shared(dir.path());
    let mut config = create_test_config(&server.uri(), 1);
    config.search.per_page = 2;

    let outcome = Coordinator::new(config, Arc::clone(&shared), tokens(1))
        .without_interrupt_handler()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(shared.visited_count().unwrap(), 3);
}
