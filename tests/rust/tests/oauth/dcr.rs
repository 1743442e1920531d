//! Dynamic client registration wire tests.

use mcplens_auth::{ClientRegistrar, ClientRegistrationRequest};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_register_posts_public_client_metadata() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"token_endpoint_auth_method\":\"none\""))
        .and(body_string_contains("\"authorization_code\""))
        .and(body_string_contains("\"refresh_token\""))
        .and(body_string_contains(
            "http://localhost:6274/oauth/callback",
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "client_id": "new-client",
            "client_secret": "new-secret",
            "client_id_issued_at": 1700000000
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registrar = ClientRegistrar::new();
    let request = ClientRegistrationRequest::new("http://localhost:6274/oauth/callback");
    let response = registrar
        .register(&format!("{}/register", mock_server.uri()), &request)
        .await
        .unwrap();

    assert_eq!(response.client_id, "new-client");
    assert_eq!(response.client_secret.as_deref(), Some("new-secret"));

    let stored = response.into_stored();
    assert_eq!(stored.client_id, "new-client");
    assert!(stored.issued_at.is_some());
}

#[tokio::test]
async fn test_register_includes_requested_scope() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_string_contains("\"scope\":\"mcp.read mcp.write\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "client_id": "scoped-client"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registrar = ClientRegistrar::new();
    let request = ClientRegistrationRequest::new("http://localhost:6274/oauth/callback")
        .with_scopes(&["mcp.read".to_string(), "mcp.write".to_string()]);
    let response = registrar
        .register(&format!("{}/register", mock_server.uri()), &request)
        .await
        .unwrap();

    assert_eq!(response.client_id, "scoped-client");
}

#[tokio::test]
async fn test_register_error_body_is_surfaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_redirect_uri",
            "error_description": "redirect uri not allowed"
        })))
        .mount(&mock_server)
        .await;

    let registrar = ClientRegistrar::new();
    let request = ClientRegistrationRequest::new("http://localhost:6274/oauth/callback");
    let err = registrar
        .register(&format!("{}/register", mock_server.uri()), &request)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Client registration failed"));
    assert!(message.contains("invalid_redirect_uri"));
    assert!(message.contains("redirect uri not allowed"));
}

#[tokio::test]
async fn test_register_plain_http_error_is_surfaced() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
        .mount(&mock_server)
        .await;

    let registrar = ClientRegistrar::new();
    let request = ClientRegistrationRequest::new("http://localhost:6274/oauth/callback");
    let err = registrar
        .register(&format!("{}/register", mock_server.uri()), &request)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Client registration failed"));
    assert!(message.contains("500"));
}
