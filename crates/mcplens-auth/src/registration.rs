//! Dynamic client registration (RFC 7591).
//!
//! Public-client registration against the metadata's registration endpoint,
//! used when a server entry carries no client id of its own.

use chrono::DateTime;
use mcplens_core::{branding, ClientRegistration, RepoResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Registration request body.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRegistrationRequest {
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    /// Always `none` - this is a public client with PKCE.
    pub token_endpoint_auth_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl ClientRegistrationRequest {
    pub fn new(redirect_uri: &str) -> Self {
        Self {
            client_name: branding::oauth_client_name().to_string(),
            redirect_uris: vec![redirect_uri.to_string()],
            grant_types: vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ],
            response_types: vec!["code".to_string()],
            token_endpoint_auth_method: "none".to_string(),
            scope: None,
        }
    }

    pub fn with_scopes(mut self, scopes: &[String]) -> Self {
        if !scopes.is_empty() {
            self.scope = Some(scopes.join(" "));
        }
        self
    }
}

/// Registration response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistrationResponse {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub client_id_issued_at: Option<i64>,
    #[serde(default)]
    pub client_secret_expires_at: Option<i64>,
}

impl ClientRegistrationResponse {
    /// Convert into the persisted registration shape.
    pub fn into_stored(self) -> ClientRegistration {
        ClientRegistration {
            client_id: self.client_id,
            client_secret: self.client_secret,
            issued_at: self
                .client_id_issued_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

/// RFC 7591 error body returned on a failed registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Performs dynamic client registration POSTs.
#[derive(Debug, Clone)]
pub struct ClientRegistrar {
    http: reqwest::Client,
}

impl ClientRegistrar {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Register a client and return the issued credentials.
    pub async fn register(
        &self,
        registration_endpoint: &str,
        request: &ClientRegistrationRequest,
    ) -> RepoResult<ClientRegistrationResponse> {
        debug!("Registering OAuth client at {}", registration_endpoint);

        let response = self
            .http
            .post(registration_endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<RegistrationErrorResponse>(&body) {
                match err.error_description {
                    Some(desc) => {
                        anyhow::bail!("Client registration failed: {}: {}", err.error, desc)
                    }
                    None => anyhow::bail!("Client registration failed: {}", err.error),
                }
            }
            anyhow::bail!("Client registration failed: HTTP {} - {}", status, body);
        }

        Ok(response.json().await?)
    }
}

impl Default for ClientRegistrar {
    fn default() -> Self {
        Self::new()
    }
}
