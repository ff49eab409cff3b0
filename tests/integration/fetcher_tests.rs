//! HTTP fetcher behavior against mock servers

use id_sweep::config::{parse_config, FetcherConfig};
use id_sweep::crawler::{CrawlTarget, FailureReason, FetchOutcome, Fetcher, HttpFetcher};
use std::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher settings with every delay disabled
fn fast_fetcher_config(base_url: &str) -> FetcherConfig {
    parse_config(&format!(
        r#"
[crawler]
start-id = 1
end-id = 1
max-workers = 1

[fetcher]
url-template = "{base_url}/story?id={{id}}"
max-attempts = 3
timeout-secs = 5
backoff-base-ms = 0
backoff-max-ms = 0
min-delay-ms = 0
max-delay-ms = 0
user-agent = "id-sweep-test/1.0"

[output]
database-path = "unused.db"
export-path = "unused.json"
"#
    ))
    .unwrap()
    .fetcher
}

fn target(server: &MockServer, id: i64) -> CrawlTarget {
    CrawlTarget::from_template(id, &format!("{}/story?id={{id}}", server.uri()))
}

#[tokio::test]
async fn test_success_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .and(query_param("id", "7"))
        .and(header("user-agent", "id-sweep-test/1.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "<html><h1>故事</h1></html>".as_bytes(),
                "text/html; charset=utf-8",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fast_fetcher_config(&server.uri())).unwrap();
    let outcome = fetcher.fetch(&target(&server, 7)).await;

    match outcome {
        FetchOutcome::Success {
            status_code,
            content_type,
            raw_body,
        } => {
            assert_eq!(status_code, 200);
            assert!(content_type.starts_with("text/html"));
            assert!(raw_body.contains("故事"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fast_fetcher_config(&server.uri())).unwrap();
    let outcome = fetcher.fetch(&target(&server, 1)).await;

    assert!(matches!(
        outcome,
        FetchOutcome::Failure {
            reason: FailureReason::BadStatus(404)
        }
    ));
}

#[tokio::test]
async fn test_server_error_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fast_fetcher_config(&server.uri())).unwrap();
    let outcome = fetcher.fetch(&target(&server, 1)).await;

    match outcome {
        FetchOutcome::Failure { reason } => {
            assert_eq!(reason, FailureReason::BadStatus(503));
            assert_eq!(reason.as_str(), "bad_status");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recovers_after_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fast_fetcher_config(&server.uri())).unwrap();
    let outcome = fetcher.fetch(&target(&server, 1)).await;

    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_failure() {
    // Bind then drop so the port is very likely closed
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let fetcher = HttpFetcher::new(&fast_fetcher_config(&uri)).unwrap();
    let target = CrawlTarget::from_template(1, &format!("{}/story?id={{id}}", uri));
    let outcome = fetcher.fetch(&target).await;

    match outcome {
        FetchOutcome::Failure { reason } => assert_eq!(reason.as_str(), "transport"),
        other => panic!("expected failure, got {:?}", other),
    }
}
