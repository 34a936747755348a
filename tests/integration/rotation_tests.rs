//! Integration tests for credential rotation
//!
//! Each coordinator run stands in for one process generation; the loop in
//! these tests plays the part of the restart.

use serde_json::json;
use snippet_harvest::config::Config;
use snippet_harvest::crawler::{Coordinator, CredentialQueue, RunOutcome};
use snippet_harvest::state::{Ledger, SharedState};
use snippet_harvest::storage::SnippetStore;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(api_url: &str, workers: usize) -> Config {
    let mut config = Config::default();
    config.github.api_url = api_url.to_string();
    config.crawler.workers = workers;
    config.crawler.poll_interval_ms = 10;
    config.crawler.shutdown_grace_ms = 2_000;
    config
}

fn shared_in(dir: &TempDir) -> Arc<SharedState> {
    let ledger = Ledger::load(dir.path().join("ids.json")).unwrap();
    let store = SnippetStore::new(&dir.path().join("snippets.db")).unwrap();
    Arc::new(SharedState::new(ledger, store))
}

/// Runs generations until the pool stops rotating; returns the generation
/// count and the final outcome
async fn run_until_settled(
    api_url: &str,
    workers: usize,
    mut queue: CredentialQueue,
    shared: Arc<SharedState>,
    max_generations: usize,
) -> (usize, RunOutcome) {
    let mut generations = 0;

    loop {
        generations += 1;
        assert!(
            generations <= max_generations,
            "rotation did not settle within {} generations",
            max_generations
        );

        let config = create_test_config(api_url, workers);
        let outcome = Coordinator::new(config, Arc::clone(&shared), queue)
            .without_interrupt_handler()
            .run()
            .await
            .unwrap();

        match outcome {
            RunOutcome::Rotate(next) => queue = next,
            other => return (generations, other),
        }
    }
}

#[tokio::test]
async fn test_rotation_terminates_within_credential_count() {
    for k in 1..=4 {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        for i in 1..=k {
            Mock::given(method("GET"))
                .and(path("/search/repositories"))
                .and(header("authorization", format!("Bearer token-{}", i).as_str()))
                .respond_with(
                    ResponseTemplate::new(403)
                        .insert_header("x-ratelimit-remaining", "0")
                        .set_body_json(json!({"message": "API rate limit exceeded"})),
                )
                // one search call per worker, on this credential only
                .expect(2)
                .mount(&server)
                .await;
        }

        let queue =
            CredentialQueue::new((1..=k).map(|i| format!("token-{}", i)).collect(), 0).unwrap();
        let (generations, outcome) =
            run_until_settled(&server.uri(), 2, queue, shared_in(&dir), k).await;

        assert_eq!(generations, k);
        assert_eq!(outcome, RunOutcome::CredentialsExhausted);
    }
}

#[tokio::test]
async fn test_rotation_resumes_where_the_spent_credential_stopped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let repo = |id: u64, name: &str| {
        json!({
            "id": id,
            "name": name,
            "full_name": format!("octo/{}", name),
            "html_url": format!("https://github.com/octo/{}", name),
            "default_branch": "main"
        })
    };

    // The first credential can search but runs dry on the second repository
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "items": [repo(1, "first"), repo(2, "second")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/first/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"path": "lib.py", "type": "file"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/first/contents/lib.py"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("def f():\n    \"\"\"Does f.\"\"\"\n    return 1\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/second/contents"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/second/contents"))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let shared = shared_in(&dir);
    let queue = CredentialQueue::new(vec!["token-1".into(), "token-2".into()], 0).unwrap();
    let (generations, outcome) =
        run_until_settled(&server.uri(), 1, queue, Arc::clone(&shared), 2).await;

    assert_eq!(generations, 2);
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(shared.snippet_count().unwrap(), 2);

    let ledger = Ledger::load(dir.path().join("ids.json")).unwrap();
    assert_eq!(ledger.ids(), vec![1, 2]);
}
