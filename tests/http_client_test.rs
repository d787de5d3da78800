//! HTTP key service client against a mock server

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{pair, public_pem};
use e2ee_keyring::api::models::{pem_to_header, SALT_HEX_HEADER};
use e2ee_keyring::api::{ApiClient, ApiConfig, Lookup, RemoteKeyService, SubmitOutcome};
use e2ee_keyring::e2ee::{wrap, KeyLifecycle, LifecyclePath, SessionKeyCache};
use e2ee_keyring::E2eeError;
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig {
        base_url: server.uri(),
        api_key: Some(API_KEY.to_string()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_ping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("X-API-Key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Pong"})))
        .mount(&server)
        .await;

    assert!(client_for(&server).ping().await.unwrap());
}

#[tokio::test]
async fn test_ping_only_accepts_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "nope"})))
        .mount(&server)
        .await;

    let err = client_for(&server).ping().await.unwrap_err();
    assert!(matches!(err, E2eeError::UnexpectedStatus { status: 400, .. }));
}

#[tokio::test]
async fn test_slow_response_times_out_as_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/e2ee/public"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"key": "unused"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(ApiConfig {
        base_url: server.uri(),
        api_key: Some(API_KEY.to_string()),
        timeout: Duration::from_millis(100),
    })
    .unwrap();

    let lifecycle = KeyLifecycle::new(Arc::new(client), Arc::new(SessionKeyCache::new()));
    match lifecycle.initialize("pw1").await.unwrap_err() {
        E2eeError::Http(e) => assert!(e.is_timeout()),
        other => panic!("expected HTTP timeout, got {other:?}"),
    }
    assert!(lifecycle.cache().is_empty());
    assert!(!lifecycle.is_ready());
}

#[tokio::test]
async fn test_public_key_lookup_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/e2ee/public"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "No E2EE key registered"})),
        )
        .mount(&server)
        .await;

    let lookup = client_for(&server).fetch_public_key().await.unwrap();
    assert_eq!(lookup, Lookup::NotFound("No E2EE key registered".to_string()));
}

#[tokio::test]
async fn test_forbidden_is_invalid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/e2ee/public"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_public_key().await.unwrap_err();
    assert!(matches!(err, E2eeError::InvalidApiKey));
}

#[tokio::test]
async fn test_unexpected_status_carries_url_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/e2ee/private"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_wrapped_private_key()
        .await
        .unwrap_err();

    match err {
        E2eeError::UnexpectedStatus { url, status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
            assert!(url.ends_with("/e2ee/private"));
        }
        other => panic!("expected unexpected status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_submission_sends_key_material_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/e2ee"))
        .and(header("X-API-Key", API_KEY))
        .and(header_exists("X-Public-Key"))
        .and(header_exists("X-Encrypted-Private-Key"))
        .and(header_exists("X-Salt-Hex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let pem = public_pem(pair());
    let wrapped = wrap(&pair().private_key, "pw1").unwrap();

    let outcome = client_for(&server)
        .submit_key_material(&pem, &wrapped)
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);

    let requests = server.received_requests().await.unwrap();
    let sent = &requests[0];
    let salt = sent.headers.get(SALT_HEX_HEADER).unwrap().to_str().unwrap();
    assert_eq!(salt, wrapped.salt_hex());
    let public = sent.headers.get("X-Public-Key").unwrap().to_str().unwrap();
    assert_eq!(public, pem_to_header(&pem));
}

#[tokio::test]
async fn test_rejected_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/e2ee"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Keys already exist"})),
        )
        .mount(&server)
        .await;

    let wrapped = wrap(&pair().private_key, "pw1").unwrap();
    let outcome = client_for(&server)
        .submit_key_material(&public_pem(pair()), &wrapped)
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Rejected("Keys already exist".to_string()));
}

/// Recovery over HTTP, with PEM text escaped the way it travels in headers.
#[tokio::test]
async fn test_lifecycle_recovers_over_http() {
    let server = MockServer::start().await;
    let wrapped = wrap(&pair().private_key, "pw1").unwrap();

    Mock::given(method("GET"))
        .and(path("/e2ee/public"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"key": pem_to_header(&public_pem(pair()))})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/e2ee/private"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": pem_to_header(wrapped.ciphertext()),
            "salt_hex": wrapped.salt_hex(),
        })))
        .mount(&server)
        .await;

    let lifecycle = KeyLifecycle::new(
        Arc::new(client_for(&server)),
        Arc::new(SessionKeyCache::new()),
    );

    let outcome = lifecycle.initialize("pw1").await.unwrap();
    assert_eq!(outcome.path, LifecyclePath::Recovered);
    assert_eq!(outcome.fingerprint, pair().public_key.fingerprint());

    let err = KeyLifecycle::new(
        Arc::new(client_for(&server)),
        Arc::new(SessionKeyCache::new()),
    )
    .initialize("pw2")
    .await
    .unwrap_err();
    assert!(matches!(err, E2eeError::Password));
}

#[tokio::test]
async fn test_missing_credential_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::new(ApiConfig {
        base_url: server.uri(),
        api_key: None,
        timeout: Duration::from_secs(5),
    })
    .unwrap();

    let lifecycle = KeyLifecycle::new(Arc::new(client), Arc::new(SessionKeyCache::new()));
    let err = lifecycle.initialize("pw1").await.unwrap_err();
    assert!(matches!(err, E2eeError::CredentialMissing));
}
