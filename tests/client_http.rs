//! Integration tests driving `VehicleClient` against a mock HTTP server.

use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use tessie_client::{Command, ErrorKind, RetryPolicy, VehicleClient, VehicleClientBuilder};

const VIN: &str = "5YJ3E1EA7KF000316";

fn test_client(base_url: &str) -> VehicleClient {
    VehicleClientBuilder::new()
        .with_token("test-token")
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::reads().with_base_delay(Duration::from_millis(5)))
        .build()
        .expect("client should build")
}

#[tokio::test]
async fn roster_accepts_results_wrapped_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/vehicles")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"results": [{"vin": VIN, "display_name": "Roadster"}]}).to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let vehicles = client.vehicles().await.expect("roster should decode");

    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].vin, VIN);
    mock.assert_async().await;
}

#[tokio::test]
async fn repeated_read_within_ttl_hits_upstream_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", format!("/{VIN}/state").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"state": "online"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let first = client.state(VIN).await.expect("first read");
    let second = client.state(VIN).await.expect("second read");

    assert_eq!(first.state.as_deref(), Some("online"));
    assert_eq!(second.state.as_deref(), Some("online"));
    mock.assert_async().await;

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn command_invalidates_so_next_read_refetches() {
    let mut server = mockito::Server::new_async().await;
    let state_mock = server
        .mock("GET", format!("/{VIN}/state").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"state": "asleep"}).to_string())
        .expect(2)
        .create_async()
        .await;
    let command_mock = server
        .mock("POST", format!("/{VIN}/command/wake").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": true}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    client.state(VIN).await.expect("initial read");

    let outcome = client
        .send_command(VIN, Command::Wake)
        .await
        .expect("command should dispatch");
    assert!(outcome.result);

    // The cached entry was purged: this read must go back upstream even
    // though its TTL has not elapsed.
    client.state(VIN).await.expect("post-command read");

    state_mock.assert_async().await;
    command_mock.assert_async().await;
}

#[tokio::test]
async fn drive_limit_is_clamped_into_range_on_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", format!("/{VIN}/drives").as_str())
        .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"id": 1}]).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let drives = client.drives(VIN, 1000).await.expect("drives should decode");

    assert_eq!(drives.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn not_found_fails_after_a_single_attempt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", format!("/{VIN}/battery").as_str())
        .with_status(404)
        .with_body(json!({"error": "unknown vehicle"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let err = client.battery(VIN).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.retriable());
    mock.assert_async().await;
}

#[tokio::test]
async fn persistent_server_error_exhausts_all_attempts() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", format!("/{VIN}/state").as_str())
        .with_status(503)
        .with_body("upstream down")
        .expect(3)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let err = client.state(VIN).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert!(err.retriable());
    mock.assert_async().await;
}

#[tokio::test]
async fn authentication_failure_is_terminal_and_sanitized() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/vehicles")
        .with_status(401)
        .with_body(json!({"error": "bad token"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let err = client.vehicles().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    let descriptor = err.api().expect("classified descriptor");
    assert!(!descriptor.suggestion.is_empty());
    // The bearer credential must not survive into the echoed diagnostics.
    assert!(!descriptor.details.to_string().contains("test-token"));
    mock.assert_async().await;
}

#[tokio::test]
async fn unrecognized_payload_shape_is_a_hard_failure() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/vehicles")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"unexpected": "shape"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let err = client.vehicles().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnknownFormat);
    assert!(!err.retriable());
    mock.assert_async().await;

    // Nothing was cached: the next call goes upstream again.
    let err = client.vehicles().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFormat);
}

#[tokio::test]
async fn validation_failures_never_touch_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = test_client(&server.url());
    let err = client.state("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = client.state("not a vin").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    mock.assert_async().await;
}
