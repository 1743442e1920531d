//! Silent token refresh via the OAuth refresh grant.

use std::sync::Arc;

use mcplens_core::{
    KeyValueRepository, RepoResult, ServerEntry, StoredOAuthConfig, StoredTokenSet,
    TransportConfig,
};
use tracing::{debug, info, warn};

use crate::discovery::OAuthDiscovery;
use crate::flow::OAuthFlow;
use crate::token_store::OAuthDataStore;

/// Outcome of a refresh attempt. `Failed` covers every expected failure
/// (no refresh token, discovery failure, rejected grant); the caller falls
/// back to a fresh authorization flow.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Refreshed { config: TransportConfig },
    Failed,
}

/// Attempts the refresh-token grant for a saved server.
#[derive(Clone)]
pub struct TokenRefreshClient {
    data: OAuthDataStore,
    discovery: OAuthDiscovery,
    flow: OAuthFlow,
}

impl TokenRefreshClient {
    pub fn new(storage: Arc<dyn KeyValueRepository>) -> Self {
        Self {
            data: OAuthDataStore::new(storage),
            discovery: OAuthDiscovery::new(),
            flow: OAuthFlow::new(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.discovery = OAuthDiscovery::with_client(http.clone());
        self.flow = OAuthFlow::with_client(http);
        self
    }

    /// Refresh the server's tokens and persist the replacement set.
    ///
    /// On success the whole new token set is written in a single store
    /// write and the returned config carries the fresh access token. On
    /// failure nothing is written; the prior set stays intact.
    pub async fn refresh_oauth_tokens(&self, server: &ServerEntry) -> RepoResult<RefreshOutcome> {
        let stored = self.data.get_stored_tokens(server.id, &server.name).await?;
        let tokens = match stored.or_else(|| server.oauth_tokens.clone()) {
            Some(tokens) => tokens,
            None => {
                debug!("[OAuth] No token set for {}, nothing to refresh", server.name);
                return Ok(RefreshOutcome::Failed);
            }
        };

        let refresh_token = match &tokens.refresh_token {
            Some(token) => token.clone(),
            None => {
                debug!("[OAuth] No refresh token for {}", server.name);
                return Ok(RefreshOutcome::Failed);
            }
        };

        let registration = self
            .data
            .get_client_registration(server.id, &server.name)
            .await?;
        let client_id = match tokens
            .client_id
            .clone()
            .or_else(|| registration.as_ref().map(|r| r.client_id.clone()))
        {
            Some(client_id) => client_id,
            None => {
                debug!("[OAuth] No client id for {}, cannot refresh", server.name);
                return Ok(RefreshOutcome::Failed);
            }
        };
        let client_secret = tokens
            .client_secret
            .clone()
            .or_else(|| registration.as_ref().and_then(|r| r.client_secret.clone()));

        let server_url = match server.config.url() {
            Some(url) => Some(url.to_string()),
            None => {
                self.data
                    .get_legacy_server_url(server.id, &server.name)
                    .await?
            }
        };
        let server_url = match server_url {
            Some(url) => url,
            None => {
                debug!("[OAuth] No server URL for {}, cannot refresh", server.name);
                return Ok(RefreshOutcome::Failed);
            }
        };

        // Cached metadata avoids a discovery round trip on every reconnect.
        let config = self.data.get_oauth_config(server.id, &server.name).await?;
        let cached = config.as_ref().and_then(|c| c.metadata.clone());
        let metadata = match cached {
            Some(metadata) => metadata,
            None => match self.discovery.discover(&server_url).await {
                Ok(wire) => {
                    let metadata = wire.into_stored();
                    let updated = StoredOAuthConfig {
                        scopes: config.and_then(|c| c.scopes),
                        metadata: Some(metadata.clone()),
                    };
                    self.data.save_oauth_config(server.id, &updated).await?;
                    metadata
                }
                Err(e) => {
                    warn!("[OAuth] Discovery failed for {}: {}", server.name, e);
                    return Ok(RefreshOutcome::Failed);
                }
            },
        };

        let response = match self
            .flow
            .refresh_token(
                &metadata,
                &client_id,
                client_secret.as_deref(),
                &refresh_token,
                Some(&server_url),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("[OAuth] Token refresh failed for {}: {}", server.name, e);
                return Ok(RefreshOutcome::Failed);
            }
        };

        // Build the complete replacement set before the single write. A
        // server that does not rotate refresh tokens keeps the prior one.
        let new_tokens = StoredTokenSet {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone().or(Some(refresh_token)),
            expires_at: response.expires_at(),
            client_id: Some(client_id),
            client_secret,
            scopes: tokens.scopes.clone(),
        };
        self.data.save_tokens(server.id, &new_tokens).await?;

        info!("[OAuth] Refreshed tokens for {}", server.name);
        Ok(RefreshOutcome::Refreshed {
            config: server.config.with_bearer_token(&response.access_token),
        })
    }
}
