//! Retry behaviour of the HTTP transport against a mock server.

use mockito::{Matcher, Server};
use reqwest::Method;
use sgcloud_autoscaler::transport::{BearerAuth, DefaultRetryPolicy, HttpTransport, PendingRequest};
use sgcloud_autoscaler::{ClientConfig, Error};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn transport(max_retries: u32) -> HttpTransport {
    let config = ClientConfig::new().with_retry_policy(Arc::new(DefaultRetryPolicy::new(
        max_retries,
        Duration::from_millis(1),
    )));
    HttpTransport::new(&config).expect("transport")
}

#[tokio::test]
async fn test_always_503_is_sent_max_retries_plus_one_times() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/cluster/nodes/add")
        .with_status(503)
        .with_body("overloaded")
        .expect(4)
        .create_async()
        .await;

    let request = PendingRequest::new(Method::POST, format!("{}/cluster/nodes/add", server.url()))
        .with_body(r#"{"clusterId":"c-1","delta":2}"#);
    let err = transport(3).send(&request).await.unwrap_err();

    mock.assert_async().await;
    match err {
        Error::Remote { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_retries_resend_identical_body() {
    let mut server = Server::new_async().await;
    let raw = r#"{"z":1,"a":{"y":2,"b":3}}"#;
    let mock = server
        .mock("POST", "/echo")
        .match_body(Matcher::Exact(raw.to_string()))
        .match_header("content-type", "application/json")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let request =
        PendingRequest::new(Method::POST, format!("{}/echo", server.url())).with_body(raw);
    let err = transport(2).send(&request).await.unwrap_err();

    mock.assert_async().await;
    assert!(err.is_server_error());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/cluster/group")
        .with_status(404)
        .with_body(r#"{"message":"no such group"}"#)
        .expect(1)
        .create_async()
        .await;

    let request = PendingRequest::new(Method::GET, format!("{}/v1/cluster/group", server.url()));
    let err = transport(5).send(&request).await.unwrap_err();

    mock.assert_async().await;
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no such group"));
}

#[tokio::test]
async fn test_success_returns_after_one_attempt() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/cluster/get")
        .with_status(200)
        .with_body(r#"{"ID":"c-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let request = PendingRequest::new(Method::POST, format!("{}/cluster/get", server.url()))
        .with_json(&serde_json::json!({ "id": "c-1" }))
        .unwrap();
    let resp = transport(3).send(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(resp.status, 200);
    assert_eq!(&resp.body[..], br#"{"ID":"c-1"}"#);
}

#[tokio::test]
async fn test_every_attempt_is_signed() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/cluster/nodes/delete")
        .match_header("authorization", "Bearer secret-token")
        .match_header("x-sgcloud-request-id", Matcher::Any)
        .with_status(502)
        .expect(2)
        .create_async()
        .await;

    let config = ClientConfig::new()
        .with_retry_policy(Arc::new(DefaultRetryPolicy::new(1, Duration::from_millis(1))))
        .with_auth(Arc::new(BearerAuth::new("secret-token")));
    let transport = HttpTransport::new(&config).unwrap();
    let request = PendingRequest::new(
        Method::POST,
        format!("{}/cluster/nodes/delete", server.url()),
    )
    .with_body("{}");
    let err = transport.send(&request).await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_connection_failure_is_retried_with_backoff() {
    // Nothing listens on port 1.
    let config = ClientConfig::new().with_retry_policy(Arc::new(DefaultRetryPolicy::new(
        2,
        Duration::from_millis(40),
    )));
    let transport = HttpTransport::new(&config).unwrap();
    let request = PendingRequest::new(Method::GET, "http://127.0.0.1:1/cluster/get");

    let start = Instant::now();
    let err = transport.send(&request).await.unwrap_err();

    assert!(err.is_transport(), "{err:?}");
    // Two retries, each capped at 40ms.
    assert!(start.elapsed() >= Duration::from_millis(80), "{:?}", start.elapsed());
}

#[tokio::test]
async fn test_unbuildable_request_is_not_retried() {
    let config = ClientConfig::new().with_retry_policy(Arc::new(DefaultRetryPolicy::new(
        3,
        Duration::from_millis(200),
    )));
    let transport = HttpTransport::new(&config).unwrap();
    let request = PendingRequest::new(Method::GET, "not a url");

    let start = Instant::now();
    let err = transport.send(&request).await.unwrap_err();

    assert!(!err.is_transport(), "{err:?}");
    match &err {
        Error::Configuration { context, .. } => {
            assert_eq!(context.field_path.as_deref(), Some("request.url"));
            assert_eq!(context.source.as_deref(), Some("http_transport"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(start.elapsed() < Duration::from_millis(200), "{:?}", start.elapsed());
}
