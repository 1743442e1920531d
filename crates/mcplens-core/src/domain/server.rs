use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::tokens::StoredTokenSet;

/// A saved MCP server entry as persisted by the inspector UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Unique identifier, assigned at creation, never reused
    pub id: Uuid,

    /// Display name; doubles as the legacy storage key for pre-id data
    pub name: String,

    /// Transport configuration. Owned by the server-management UI;
    /// the orchestrator only reads it.
    pub config: TransportConfig,

    /// OAuth intent: `Some(true)` = must use OAuth, `Some(false)` =
    /// explicitly no auth, `None` = legacy/unknown (inferred from the
    /// presence of stored tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_oauth: Option<bool>,

    /// Snapshot of the token set from the last completed flow.
    /// The durable source of truth is the token store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_tokens: Option<StoredTokenSet>,
}

impl ServerEntry {
    /// Create a new entry with a fresh id and no OAuth state
    pub fn new(name: impl Into<String>, config: TransportConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            config,
            use_oauth: None,
            oauth_tokens: None,
        }
    }

    /// Set the OAuth intent
    pub fn with_oauth(mut self, enabled: bool) -> Self {
        self.use_oauth = Some(enabled);
        self
    }

    /// Attach a token snapshot
    pub fn with_tokens(mut self, tokens: StoredTokenSet) -> Self {
        self.oauth_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    Http {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

impl TransportConfig {
    /// Shorthand for an HTTP transport with no extra headers
    pub fn http(url: impl Into<String>) -> Self {
        TransportConfig::Http {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// The server URL for URL-based transports, `None` for stdio
    pub fn url(&self) -> Option<&str> {
        match self {
            TransportConfig::Http { url, .. } => Some(url),
            TransportConfig::Stdio { .. } => None,
        }
    }

    /// Copy of this config with an `Authorization: Bearer <token>` header.
    ///
    /// Existing headers are preserved; a prior Authorization header is
    /// replaced. Stdio transports carry no headers and are returned
    /// unchanged.
    pub fn with_bearer_token(&self, access_token: &str) -> Self {
        match self {
            TransportConfig::Http { url, headers } => {
                let mut headers = headers.clone();
                headers.insert(
                    "Authorization".to_string(),
                    format!("Bearer {}", access_token),
                );
                TransportConfig::Http {
                    url: url.clone(),
                    headers,
                }
            }
            stdio @ TransportConfig::Stdio { .. } => stdio.clone(),
        }
    }
}
