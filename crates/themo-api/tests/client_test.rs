// Integration tests for `ThemoClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use themo_api::{Error, ThemoClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ThemoClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let client = ThemoClient::with_client(reqwest::Client::new(), base);
    (server, client)
}

fn password(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "abc123" })))
        .mount(server)
        .await;
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_sends_credentials_and_stores_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(query_param("api-version", "1.0"))
        .and(body_json(json!({
            "Username": "user@example.com",
            "Password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.is_authenticated());
    client
        .authenticate("user@example.com", &password("hunter2"))
        .await
        .unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_authenticate_rejects_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client
        .authenticate("user@example.com", &password("wrong"))
        .await;

    match result {
        Err(e @ Error::Authentication { .. }) => assert!(e.is_auth_expired()),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_authenticate_rejects_missing_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Expires": 3600 })))
        .mount(&server)
        .await;

    let result = client
        .authenticate("user@example.com", &password("hunter2"))
        .await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("no token"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

// ── Session endpoints ───────────────────────────────────────────────

#[tokio::test]
async fn test_requests_carry_bearer_token_and_api_version() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/environments"))
        .and(query_param("api-version", "1.0"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": 7, "Name": "Home" },
            { "Id": 8, "Name": "Cabin" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    client
        .authenticate("user@example.com", &password("hunter2"))
        .await
        .unwrap();

    let environments = client.environments().await.unwrap();
    assert_eq!(environments.len(), 2);
    assert_eq!(environments[0].id, 7);
    assert_eq!(environments[1].name.as_deref(), Some("Cabin"));
}

#[tokio::test]
async fn test_client_info() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/clients/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": 991,
            "Email": "user@example.com",
            "Name": "User",
        })))
        .mount(&server)
        .await;

    let info = client.client_info().await.unwrap();
    assert_eq!(info.id, 991);
    assert_eq!(info.email.as_deref(), Some("user@example.com"));
}

// ── Device discovery ────────────────────────────────────────────────

#[tokio::test]
async fn test_devices_walks_all_environments() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": 7, "Name": "Home" },
            { "Id": 8, "Name": "Cabin" },
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/environments/7/devices"))
        .and(query_param("state", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "Id": 42,
                "Name": "Hallway",
                "DeviceId": "TH-001122",
                "State": { "RT": 20.5, "MT": 21.0, "Mode": "Manual", "Lights": 1, "SW": "2.4.1" }
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/environments/8/devices"))
        .and(query_param("state", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": 43, "Name": "Sauna", "DeviceId": "TH-003344" }
        ])))
        .mount(&server)
        .await;

    let devices = client.devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id, "42");
    assert_eq!(devices[0].environment_id, "7");
    assert_eq!(devices[0].name.as_deref(), Some("Hallway"));
    assert_eq!(devices[0].room_temperature, Some(20.5));
    assert_eq!(devices[0].lights, Some(true));
    assert_eq!(devices[0].sw_version.as_deref(), Some("2.4.1"));
    assert_eq!(devices[1].id, "43");
    assert_eq!(devices[1].environment_id, "8");
    assert!(devices[1].room_temperature.is_none());
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_device_not_found_maps_to_api_404() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/environments/7/devices/999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("device not found"))
        .mount(&server)
        .await;

    let err = client.get_device("7", "999").await.unwrap_err();

    assert!(err.is_not_found());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "device not found");
        }
        other => panic!("expected Api 404 error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_maps_to_api() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.environments().await;

    match result {
        Err(Error::Api { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected Api 500 error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_expired_token_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.environments().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/environments"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let client = ThemoClient::with_client(http, Url::parse(&server.uri()).unwrap());

    let err = client.environments().await.unwrap_err();

    assert!(err.is_transient(), "timeout should classify as transient: {err:?}");
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_undecodable_body_surfaces_raw_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/environments"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client.environments().await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => {
            assert_eq!(body, "<html>maintenance</html>");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Session close ───────────────────────────────────────────────────

#[tokio::test]
async fn test_close_prevents_further_requests() {
    let (server, client) = setup().await;
    mount_login(&server).await;

    client
        .authenticate("user@example.com", &password("hunter2"))
        .await
        .unwrap();

    client.close();

    assert!(!client.is_authenticated());
    let result = client.environments().await;
    assert!(matches!(result, Err(Error::SessionClosed)));
}
