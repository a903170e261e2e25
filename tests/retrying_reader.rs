//! Integration tests for the retrying reader over real client handles
//!
//! The mock service answers 404 or 412 for a while before the data becomes
//! visible, the way a follower node does before it has applied a write.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vaultline::observability::MetricsRecorder;
use vaultline::{
    ClientHandleFactory, Error, ReadOutcome, RetryPolicy, RetryingReader, TransportConfig,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Credentials {
    username: String,
}

fn factory(server: &MockServer) -> ClientHandleFactory {
    ClientHandleFactory::construct_with_metrics(
        TransportConfig::new(server.uri()).with_token("hvs.test"),
        MetricsRecorder::disabled(),
    )
    .unwrap()
}

fn reader(max_attempts: u32) -> RetryingReader {
    RetryingReader::new(RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5)))
        .with_metrics(MetricsRecorder::disabled())
}

async fn lagging(server: &MockServer, route: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"errors": []})))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"username": "app"}})),
        )
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

#[tokio::test]
async fn test_read_succeeds_once_replicated() {
    let server = MockServer::start().await;
    lagging(&server, "/v1/secret/app", 404, 2).await;

    let factory = factory(&server);
    let outcome: ReadOutcome<Credentials> =
        reader(5).read(factory.handle(), "secret/app").await.unwrap();

    assert_eq!(outcome.payload, Credentials { username: "app".into() });
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.retries(), 2);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_conflicts_then_success() {
    let server = MockServer::start().await;
    lagging(&server, "/v1/secret/app", 412, 1).await;

    let factory = factory(&server);
    let outcome: ReadOutcome<Credentials> =
        reader(5).read(factory.handle(), "secret/app").await.unwrap();
    assert_eq!(outcome.retries(), 1);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_first_try_success_has_no_retries() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/secret/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"username": "app"}})))
        .mount(&server)
        .await;

    let factory = factory(&server);
    let outcome: ReadOutcome<Credentials> =
        reader(5).read(factory.handle(), "secret/app").await.unwrap();
    assert_eq!(outcome.retries(), 0);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_never_replicated_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/secret/ghost")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

    let factory = factory(&server);
    let err = reader(4).read::<_, Credentials>(factory.handle(), "secret/ghost").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound { ref path, attempts: 4 } if path == "secret/ghost"));
    assert_eq!(request_count(&server).await, 4);
}

#[tokio::test]
async fn test_persistent_conflict_is_generic_failure() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/secret/racy")).respond_with(ResponseTemplate::new(412)).mount(&server).await;

    let factory = factory(&server);
    let err = reader(3).read::<_, Credentials>(factory.handle(), "secret/racy").await.unwrap_err();

    assert!(!err.is_not_found());
    assert_eq!(err.path(), Some("secret/racy"));
    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_permission_denied_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/secret/locked"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})))
        .mount(&server)
        .await;

    let factory = factory(&server);
    let err = reader(10).read::<_, Credentials>(factory.handle(), "secret/locked").await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_read_back_through_clone_is_stamped_with_write_token() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/secret/app"))
        .respond_with(ResponseTemplate::new(204).insert_header("x-vault-index", "v1:c1:7:42:"))
        .mount(&server)
        .await;
    lagging(&server, "/v1/secret/app", 412, 1).await;

    let factory = factory(&server);
    factory.handle().write("secret/app", &json!({"username": "app"})).await.unwrap();

    let sibling = factory.clone_handle_with(|c| c.token = Some("hvs.reader".into())).unwrap();
    let outcome: ReadOutcome<Credentials> = reader(3).read(&sibling, "secret/app").await.unwrap();
    assert_eq!(outcome.attempts, 2);

    let reads: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET")
        .collect();
    assert_eq!(reads.len(), 2);
    for read in reads {
        assert_eq!(read.headers.get("x-vault-index").unwrap(), "v1:c1:7:42:");
        assert_eq!(read.headers.get("x-vault-token").unwrap(), "hvs.reader");
    }
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/secret/slow")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

    let factory = factory(&server);
    let policy = RetryPolicy::new(50, Duration::from_secs(10), Duration::from_secs(10));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = reader(50)
        .read_cancellable::<_, Credentials>(factory.handle(), "secret/slow", &policy, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { attempts: 1, .. }));
    assert_eq!(request_count(&server).await, 1);
}
