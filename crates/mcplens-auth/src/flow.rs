//! OAuth 2.1 authorization-code flow wire calls.
//!
//! Builds authorization URLs and performs the form-encoded token endpoint
//! POSTs (code exchange and refresh grant). Every request carries the
//! RFC 8707 `resource` parameter when the caller knows the MCP server URL,
//! so multi-tenant authorization servers can audience-restrict the token.

use std::collections::HashMap;

use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use mcplens_core::{RepoResult, StoredOAuthMetadata};
use rand::RngCore;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::pkce::PkceChallenge;

/// Generate an unguessable CSRF `state` value (16 random bytes, base64url).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Token endpoint response for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry instant derived from `expires_in`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs as i64))
    }
}

/// Authorization-code + PKCE wire client.
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    http: reqwest::Client,
}

impl OAuthFlow {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Build the authorization URL the user is sent to.
    #[allow(clippy::too_many_arguments)]
    pub fn build_authorization_url(
        &self,
        metadata: &StoredOAuthMetadata,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
        challenge: &PkceChallenge,
        state: &str,
        resource: Option<&str>,
    ) -> RepoResult<String> {
        let mut url = Url::parse(&metadata.authorization_endpoint).with_context(|| {
            format!(
                "Invalid authorization endpoint: {}",
                metadata.authorization_endpoint
            )
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("client_id", client_id);
            pairs.append_pair("redirect_uri", redirect_uri);
            if !scopes.is_empty() {
                pairs.append_pair("scope", &scopes.join(" "));
            }
            pairs.append_pair("state", state);
            pairs.append_pair("code_challenge", &challenge.challenge);
            pairs.append_pair("code_challenge_method", &challenge.method);
            if let Some(resource) = resource {
                pairs.append_pair("resource", resource);
            }
        }

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    #[allow(clippy::too_many_arguments)]
    pub async fn exchange_code(
        &self,
        metadata: &StoredOAuthMetadata,
        client_id: &str,
        client_secret: Option<&str>,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
        resource: Option<&str>,
    ) -> RepoResult<TokenResponse> {
        debug!("Exchanging authorization code at {}", metadata.token_endpoint);

        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", client_id);
        params.insert("code_verifier", code_verifier);
        if let Some(secret) = client_secret {
            params.insert("client_secret", secret);
        }
        if let Some(resource) = resource {
            params.insert("resource", resource);
        }

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token exchange failed: HTTP {} - {}", status, body);
        }

        Ok(response.json().await?)
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(
        &self,
        metadata: &StoredOAuthMetadata,
        client_id: &str,
        client_secret: Option<&str>,
        refresh_token: &str,
        resource: Option<&str>,
    ) -> RepoResult<TokenResponse> {
        debug!("Refreshing tokens at {}", metadata.token_endpoint);

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", client_id);
        if let Some(secret) = client_secret {
            params.insert("client_secret", secret);
        }
        if let Some(resource) = resource {
            params.insert("resource", resource);
        }

        let response = self
            .http
            .post(&metadata.token_endpoint)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token refresh failed: HTTP {} - {}", status, body);
        }

        Ok(response.json().await?)
    }
}

impl Default for OAuthFlow {
    fn default() -> Self {
        Self::new()
    }
}
