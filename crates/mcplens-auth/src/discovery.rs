//! Authorization server metadata discovery (RFC 8414 / OIDC).
//!
//! MCP servers advertise their authorization server through well-known
//! documents. Some serve them under the full endpoint path, others only at
//! the URL origin, so candidates are tried path-first with an origin
//! fallback.

use std::collections::HashMap;

use mcplens_core::{RepoResult, StoredOAuthMetadata};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Authorization server metadata as served by the well-known documents.
///
/// Only the two endpoint URLs are required; everything else is optional so
/// that sparse, non-compliant servers still deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthMetadata {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub registration_endpoint: Option<String>,
    #[serde(default)]
    pub scopes_supported: Option<Vec<String>>,
    #[serde(default)]
    pub response_types_supported: Vec<String>,
    #[serde(default)]
    pub grant_types_supported: Vec<String>,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
    #[serde(default, flatten)]
    pub additional_fields: HashMap<String, serde_json::Value>,
}

impl OAuthMetadata {
    /// Whether the server advertises S256 PKCE support.
    pub fn supports_pkce(&self) -> bool {
        self.code_challenge_methods_supported
            .iter()
            .any(|m| m == "S256")
    }

    /// Convert into the persisted metadata shape.
    pub fn into_stored(self) -> StoredOAuthMetadata {
        StoredOAuthMetadata {
            authorization_endpoint: self.authorization_endpoint,
            token_endpoint: self.token_endpoint,
            registration_endpoint: self.registration_endpoint,
            issuer: self.issuer,
            scopes_supported: self.scopes_supported,
            additional_fields: self.additional_fields,
        }
    }
}

/// Extract the origin (scheme + host + port) from a URL.
pub fn extract_origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let mut origin = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        origin = format!("{}:{}", origin, port);
    }
    Some(origin)
}

/// Well-known URLs to probe for a server URL, in priority order.
///
/// OIDC discovery before plain OAuth metadata, the endpoint path before the
/// origin. The origin pair is skipped when the server URL has no path.
pub fn discovery_candidates(server_url: &str) -> Vec<String> {
    let base = server_url.trim_end_matches('/');
    let mut candidates = vec![
        format!("{}/.well-known/openid-configuration", base),
        format!("{}/.well-known/oauth-authorization-server", base),
    ];
    if let Some(origin) = extract_origin(server_url) {
        if origin != base {
            candidates.push(format!("{}/.well-known/openid-configuration", origin));
            candidates.push(format!("{}/.well-known/oauth-authorization-server", origin));
        }
    }
    candidates
}

/// Fetches authorization server metadata for an MCP server URL.
#[derive(Debug, Clone)]
pub struct OAuthDiscovery {
    http: reqwest::Client,
}

impl OAuthDiscovery {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Try each discovery candidate in order and return the first metadata
    /// document that parses.
    pub async fn discover(&self, server_url: &str) -> RepoResult<OAuthMetadata> {
        let candidates = discovery_candidates(server_url);
        for candidate in &candidates {
            match self.fetch_metadata(candidate).await {
                Ok(metadata) => {
                    debug!("Discovered OAuth metadata at {}", candidate);
                    return Ok(metadata);
                }
                Err(e) => {
                    debug!("No OAuth metadata at {}: {}", candidate, e);
                }
            }
        }
        anyhow::bail!("No OAuth metadata found for {}", server_url)
    }

    async fn fetch_metadata(&self, url: &str) -> RepoResult<OAuthMetadata> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Metadata fetch failed: HTTP {}", response.status());
        }

        Ok(response.json().await?)
    }
}

impl Default for OAuthDiscovery {
    fn default() -> Self {
        Self::new()
    }
}
