use super::*;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-session-token";

fn test_transfer() -> HttpTransfer {
    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    HttpTransfer::new(
        &CoordinatorConfig::default(),
        &retry,
        &SessionToken::new(TOKEN),
    )
    .unwrap()
}

#[test]
fn test_new_rejects_missing_token() {
    let result = HttpTransfer::new(
        &CoordinatorConfig::default(),
        &RetryConfig::default(),
        &SessionToken::default(),
    );
    assert!(matches!(result, Err(Error::MissingSessionToken)));
}

#[test]
fn test_new_rejects_invalid_header_name() {
    let coordinator = CoordinatorConfig {
        session_header: "not a header".into(),
        ..Default::default()
    };
    let result = HttpTransfer::new(
        &coordinator,
        &RetryConfig::default(),
        &SessionToken::new(TOKEN),
    );
    assert!(matches!(result, Err(Error::Config { .. })));
}

#[test]
fn test_debug_does_not_leak_token() {
    let rendered = format!("{:?}", test_transfer());
    assert!(!rendered.contains(TOKEN), "got: {rendered}");
}

#[tokio::test]
async fn test_fetch_writes_body_and_sends_session_header() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vo/download"))
        .and(header("X-Session-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string("example.com\nexample.org\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("input.txt");
    let url = format!("{}/api/vo/download", mock_server.uri());

    let written = test_transfer().fetch(&url, &dest).await.unwrap();

    assert_eq!(written, 24);
    assert_eq!(
        std::fs::read_to_string(&dest).unwrap(),
        "example.com\nexample.org\n"
    );
}

#[tokio::test]
async fn test_fetch_truncates_previous_content() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("short\n"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("input.txt");
    std::fs::write(&dest, "a much longer previous batch\nthat must disappear\n").unwrap();

    test_transfer()
        .fetch(&format!("{}/batch", mock_server.uri()), &dest)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "short\n");
}

#[tokio::test]
async fn test_fetch_bad_status_is_not_retried_and_creates_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("input.txt");
    let url = format!("{}/api/vo/download", mock_server.uri());

    let result = test_transfer().fetch(&url, &dest).await;

    match result {
        Err(Error::BadStatus { url: failed, status }) => {
            assert_eq!(status, 503);
            assert_eq!(failed, url);
        }
        other => panic!("expected BadStatus, got {other:?}"),
    }
    assert!(!dest.exists(), "a failed fetch must not create the file");
}

#[tokio::test]
async fn test_fetch_bad_status_leaves_existing_file_alone() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("resolvers.txt");
    std::fs::write(&dest, "8.8.8.8\n").unwrap();

    let result = test_transfer()
        .fetch(&format!("{}/missing", mock_server.uri()), &dest)
        .await;

    assert!(matches!(result, Err(Error::BadStatus { status: 404, .. })));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "8.8.8.8\n");
}

#[tokio::test]
async fn test_fetch_transport_failure_is_network_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("input.txt");

    let result = test_transfer()
        .fetch(&format!("http://127.0.0.1:{port}/download"), &dest)
        .await;

    match result {
        Err(e @ Error::Network(_)) => {
            assert_eq!(e.disposition(), crate::error::Disposition::Retryable)
        }
        other => panic!("expected Network error, got {other:?}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_submit_sends_multipart_file_field() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/vo/upload"))
        .and(header("X-Session-Token", TOKEN))
        .and(body_string_contains("name=\"myFile\""))
        .and(body_string_contains("filename=\"results.txt\""))
        .and(body_string_contains("example.com\n"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("results.txt");
    std::fs::write(&source, "example.com\n").unwrap();

    test_transfer()
        .submit(&format!("{}/api/vo/upload", mock_server.uri()), &source)
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&source).unwrap(),
        "example.com\n",
        "submit must not modify its source"
    );
}

#[tokio::test]
async fn test_submit_bad_status_is_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("results.txt");
    std::fs::write(&source, "example.com\n").unwrap();

    let result = test_transfer()
        .submit(&format!("{}/api/vo/upload", mock_server.uri()), &source)
        .await;

    assert!(matches!(result, Err(Error::BadStatus { status: 500, .. })));
}

#[tokio::test]
async fn test_submit_missing_source_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = test_transfer()
        .submit("http://127.0.0.1:9/upload", &dir.path().join("absent.txt"))
        .await;

    assert!(matches!(result, Err(Error::Io(_))));
}
