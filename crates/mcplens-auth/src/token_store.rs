//! Key-scoped persistence for OAuth data.
//!
//! Every piece of OAuth state for a server lives in the key-value store as
//! a whole JSON value under `<kind>.<server_id>`. Entries written before
//! servers had stable ids used `<kind>.<server_name>` instead; those are
//! still readable through the migration fallback but are never written.

use std::sync::Arc;

use mcplens_core::{
    ClientRegistration, KeyValueRepository, RepoResult, StoredOAuthConfig, StoredTokenSet,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// The kinds of OAuth data persisted per server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthDataKind {
    Tokens,
    Client,
    Config,
    ServerUrl,
}

impl OAuthDataKind {
    pub const ALL: [OAuthDataKind; 4] = [
        OAuthDataKind::Tokens,
        OAuthDataKind::Client,
        OAuthDataKind::Config,
        OAuthDataKind::ServerUrl,
    ];

    /// Key namespace prefix for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthDataKind::Tokens => "mcp-tokens",
            OAuthDataKind::Client => "mcp-client",
            OAuthDataKind::Config => "mcp-oauth-config",
            OAuthDataKind::ServerUrl => "mcp-serverUrl",
        }
    }

    /// Current key scheme, keyed by the server's stable id.
    pub fn current_key(&self, server_id: Uuid) -> String {
        format!("{}.{}", self.as_str(), server_id)
    }

    /// Legacy key scheme, keyed by the user-facing server name.
    pub fn legacy_key(&self, server_name: &str) -> String {
        format!("{}.{}", self.as_str(), server_name)
    }
}

/// Durable OAuth data store over the persistent key-value surface.
#[derive(Clone)]
pub struct OAuthDataStore {
    storage: Arc<dyn KeyValueRepository>,
}

impl OAuthDataStore {
    pub fn new(storage: Arc<dyn KeyValueRepository>) -> Self {
        Self { storage }
    }

    /// Read a raw value, trying the id-based key first and falling back to
    /// the name-based legacy key. Never writes the migrated value back;
    /// reads stay side-effect free.
    pub async fn read_with_migration(
        &self,
        kind: OAuthDataKind,
        server_id: Uuid,
        server_name: &str,
    ) -> RepoResult<Option<String>> {
        if let Some(value) = self.storage.get(&kind.current_key(server_id)).await? {
            return Ok(Some(value));
        }
        let legacy = kind.legacy_key(server_name);
        match self.storage.get(&legacy).await? {
            Some(value) => {
                debug!("[TokenStore] Read {} via legacy key {}", kind.as_str(), legacy);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Stored token set for a server, current key scheme only.
    pub async fn get_stored_tokens(
        &self,
        server_id: Uuid,
        server_name: &str,
    ) -> RepoResult<Option<StoredTokenSet>> {
        let key = OAuthDataKind::Tokens.current_key(server_id);
        match self.storage.get(&key).await? {
            Some(raw) => Ok(self.parse_json(&key, &raw)),
            None => {
                debug!("[TokenStore] No stored tokens for {}", server_name);
                Ok(None)
            }
        }
    }

    /// Persist a complete token set in a single write.
    pub async fn save_tokens(&self, server_id: Uuid, tokens: &StoredTokenSet) -> RepoResult<()> {
        self.write_json(&OAuthDataKind::Tokens.current_key(server_id), tokens)
            .await
    }

    pub async fn get_client_registration(
        &self,
        server_id: Uuid,
        server_name: &str,
    ) -> RepoResult<Option<ClientRegistration>> {
        let raw = self
            .read_with_migration(OAuthDataKind::Client, server_id, server_name)
            .await?;
        Ok(raw.and_then(|raw| self.parse_json(OAuthDataKind::Client.as_str(), &raw)))
    }

    pub async fn save_client_registration(
        &self,
        server_id: Uuid,
        registration: &ClientRegistration,
    ) -> RepoResult<()> {
        self.write_json(&OAuthDataKind::Client.current_key(server_id), registration)
            .await
    }

    pub async fn get_oauth_config(
        &self,
        server_id: Uuid,
        server_name: &str,
    ) -> RepoResult<Option<StoredOAuthConfig>> {
        let raw = self
            .read_with_migration(OAuthDataKind::Config, server_id, server_name)
            .await?;
        Ok(raw.and_then(|raw| self.parse_json(OAuthDataKind::Config.as_str(), &raw)))
    }

    pub async fn save_oauth_config(
        &self,
        server_id: Uuid,
        config: &StoredOAuthConfig,
    ) -> RepoResult<()> {
        self.write_json(&OAuthDataKind::Config.current_key(server_id), config)
            .await
    }

    /// Server URL persisted by older builds that stored it separately from
    /// the transport config. Plain string value, not JSON.
    pub async fn get_legacy_server_url(
        &self,
        server_id: Uuid,
        server_name: &str,
    ) -> RepoResult<Option<String>> {
        self.read_with_migration(OAuthDataKind::ServerUrl, server_id, server_name)
            .await
    }

    /// Delete every OAuth data kind for a server under both key schemes.
    /// Safe to call when nothing is stored.
    pub async fn clear_oauth_data(&self, server_id: Uuid, server_name: &str) -> RepoResult<()> {
        for kind in OAuthDataKind::ALL {
            self.storage.delete(&kind.current_key(server_id)).await?;
            self.storage.delete(&kind.legacy_key(server_name)).await?;
        }
        debug!("[TokenStore] Cleared OAuth data for {}", server_name);
        Ok(())
    }

    fn parse_json<T: DeserializeOwned>(&self, key: &str, raw: &str) -> Option<T> {
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("[TokenStore] Ignoring corrupt value under {}: {}", key, e);
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> RepoResult<()> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json).await
    }
}
