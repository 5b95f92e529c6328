use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;

fn test_build() -> BuildInfo {
    BuildInfo {
        version: "0.1.0".into(),
        rustc: "1.93.0".into(),
        commit: "deadbeef".into(),
        build_date: "2026-10-19".into(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_router(test_build(), &StatusConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_version_reports_build_info() {
    let app = create_router(test_build(), &StatusConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/version")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], "0.1.0");
    assert_eq!(body["rustc"], "1.93.0");
    assert_eq!(body["commit"], "deadbeef");
    assert_eq!(body["build_date"], "2026-10-19");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_router(test_build(), &StatusConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/downloads").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_over_real_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_handle = tokio::spawn(async move {
        serve(listener, test_build(), &StatusConfig::default()).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    let response = reqwest::get(format!("http://{addr}/version")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["commit"], "deadbeef");

    server_handle.abort();
}

#[tokio::test]
async fn test_start_fails_when_address_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = StatusConfig {
        bind_address: taken.local_addr().unwrap(),
        ..Default::default()
    };

    let result = start_status_server(config, test_build()).await;

    match result {
        Err(e @ Error::StatusServer(_)) => assert!(e.to_string().contains("failed to bind")),
        other => panic!("expected StatusServer error, got {other:?}"),
    }
}
