//! Integration tests for the timed HTTP client against local servers

mod common;

use apid::http::{HttpClient, HttpError, Request, TimedClient};
use common::{closed_port, spawn_http_server, spawn_tls_server};
use http::StatusCode;
use std::time::Duration;

#[tokio::test]
async fn test_server_processing_tracks_response_delay() {
    let delay = Duration::from_millis(300);
    let addr = spawn_http_server(delay, "slow");
    let client = TimedClient::new().unwrap();

    let response = client
        .execute(Request::get(&format!("http://{addr}/slow")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "slow");

    let timings = response.timings;
    assert!(
        timings.server_processing >= delay,
        "server processing {:?} shorter than delay",
        timings.server_processing
    );
    assert!(timings.server_processing < delay + Duration::from_secs(2));
    // IP literal and plain HTTP
    assert_eq!(timings.dns_lookup, Duration::ZERO);
    assert_eq!(timings.tls_handshake, Duration::ZERO);
    assert!(timings.total() >= timings.server_processing);
}

#[tokio::test]
async fn test_host_name_goes_through_resolution() {
    let addr = spawn_http_server(Duration::ZERO, "hi");
    let client = TimedClient::new().unwrap();

    let response = client
        .execute(Request::get(&format!("http://localhost:{}/", addr.port())).unwrap())
        .await
        .unwrap();

    assert_eq!(response.text(), "hi");
    assert_eq!(response.headers["content-type"], "text/plain");
}

#[tokio::test]
async fn test_self_signed_tls_requires_skip_verify() {
    let addr = spawn_tls_server("secure");
    let client = TimedClient::new().unwrap();
    let url = format!("https://localhost:{}/", addr.port());

    let response = client
        .execute(Request::get(&url).unwrap().with_skip_verify(true))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "secure");
    assert!(response.timings.tls_handshake > Duration::ZERO);

    let err = client.execute(Request::get(&url).unwrap()).await.unwrap_err();
    assert!(err.is_tls(), "expected certificate error, got {err}");
}

#[tokio::test]
async fn test_client_is_reusable_across_concurrent_calls() {
    let addr = spawn_http_server(Duration::from_millis(50), "ok");
    let client = TimedClient::new().unwrap();
    let url = format!("http://{addr}/");

    let (a, b) = tokio::join!(
        client.execute(Request::get(&url).unwrap()),
        client.execute(Request::get(&url).unwrap())
    );
    assert_eq!(a.unwrap().text(), "ok");
    assert_eq!(b.unwrap().text(), "ok");
}

#[tokio::test]
async fn test_dropping_the_future_cancels_the_call() {
    let addr = spawn_http_server(Duration::from_secs(5), "late");
    let client = TimedClient::new().unwrap();

    let result = tokio::time::timeout(
        Duration::from_millis(200),
        client.execute(Request::get(&format!("http://{addr}/")).unwrap()),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_transport_errors_are_reported() {
    let client = TimedClient::new().unwrap();

    let err = client
        .execute(Request::get(&format!("http://{}/", closed_port())).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Connect { .. }));

    let err = client
        .execute(Request::get("ftp://127.0.0.1/file").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::UnsupportedScheme(_)));
}
