//! OAuth token sets and ancillary persisted OAuth data
//!
//! These are the durable shapes the token store reads and writes. A token
//! set is always replaced whole, never field-by-field, so a failed refresh
//! can never leave a half-updated value behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted OAuth token set for one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTokenSet {
    /// Access token for the MCP server
    pub access_token: String,

    /// Refresh token, when the provider issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Access token expiry time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Client id the tokens were issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret, for confidential clients only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Scopes granted with this token set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

impl StoredTokenSet {
    /// Create a token set with just an access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            client_id: None,
            client_secret: None,
            scopes: None,
        }
    }

    /// Set the refresh token
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the expiry time
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the client id
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the granted scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Check if the access token is expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false, // No expiry = never expires
        }
    }

    /// Check if this set can be refreshed without user interaction
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Get the authorization header value
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Persisted result of dynamic client registration (RFC 7591).
///
/// Separate from tokens so that clearing tokens on logout keeps the
/// registration, and re-auth reuses the existing client_id without a
/// fresh registration round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRegistration {
    /// Client id issued by the authorization server
    pub client_id: String,

    /// Client secret, when the server issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// When the client id was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl ClientRegistration {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            issued_at: None,
        }
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }
}

/// Cached OAuth metadata from server discovery.
///
/// Stored during the initial flow to avoid re-discovery on reconnect.
/// Discovery can fail for servers that don't follow the exact well-known
/// path conventions, so a cached copy keeps refresh working offline from
/// discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOAuthMetadata {
    /// Authorization endpoint URL (required)
    pub authorization_endpoint: String,
    /// Token endpoint URL (required)
    pub token_endpoint: String,
    /// Dynamic client registration endpoint (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,
    /// Issuer identifier (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Scopes the server advertises (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,
    /// Additional fields from discovery (for forward compatibility)
    #[serde(default, flatten)]
    pub additional_fields: HashMap<String, serde_json::Value>,
}

/// Persisted per-server OAuth configuration.
///
/// Holds the user-chosen scopes and the cached discovery metadata under
/// the `mcp-oauth-config` storage kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredOAuthConfig {
    /// Scopes to request when (re)authorizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// Cached OAuth metadata from initial discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StoredOAuthMetadata>,
}
