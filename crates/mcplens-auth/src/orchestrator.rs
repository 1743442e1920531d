//! The reconnection decision: skip auth, refresh silently, or start a
//! fresh authorization flow.

use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use mcplens_core::{KeyValueRepository, Navigator, OAuthResult, RepoResult, ServerEntry};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::initiator::{AuthorizationInitiator, InitiationOptions, InitiationOutcome};
use crate::refresh::{RefreshOutcome, TokenRefreshClient};
use crate::token_store::OAuthDataStore;

/// Tallies from a startup reconnect sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupReconnectSummary {
    pub servers_checked: usize,
    pub ready: usize,
    pub errors: usize,
    pub redirect_pending: bool,
}

/// Removes the in-flight marker when a run finishes on any path.
struct ActiveGuard {
    active: Arc<DashMap<(Uuid, String), Instant>>,
    key: (Uuid, String),
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}

/// Decides per saved server how to restore an authorized connection and
/// normalizes every outcome into [`OAuthResult`].
pub struct ReconnectOrchestrator {
    data: OAuthDataStore,
    refresh: TokenRefreshClient,
    initiator: AuthorizationInitiator,
    active: Arc<DashMap<(Uuid, String), Instant>>,
}

impl ReconnectOrchestrator {
    pub fn new(
        storage: Arc<dyn KeyValueRepository>,
        session: Arc<dyn KeyValueRepository>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            data: OAuthDataStore::new(storage.clone()),
            refresh: TokenRefreshClient::new(storage.clone()),
            initiator: AuthorizationInitiator::new(storage, session, navigator),
            active: Arc::new(DashMap::new()),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.refresh = self.refresh.with_http_client(http.clone());
        self.initiator = self.initiator.with_http_client(http);
        self
    }

    pub fn with_redirect_base(mut self, base: impl Into<String>) -> Self {
        self.initiator = self.initiator.with_redirect_base(base);
        self
    }

    pub fn with_desktop_platform(mut self, enabled: bool) -> Self {
        self.initiator = self.initiator.with_desktop_platform(enabled);
        self
    }

    /// The single entry point for reconnecting a saved server.
    ///
    /// Expected failures never surface as `Err`; they resolve into one of
    /// the three [`OAuthResult`] variants. `Err` means the storage layer
    /// itself failed.
    pub async fn ensure_authorized_for_reconnect(
        &self,
        server: &ServerEntry,
    ) -> RepoResult<OAuthResult> {
        // Refresh tokens are often single-use and rotating; two overlapping
        // runs against the same server can invalidate each other's grant.
        let key = (server.id, server.name.clone());
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => {
                warn!(
                    "[OAuth] Reconnect already in progress for {}, rejecting",
                    server.name
                );
                return Ok(OAuthResult::error(format!(
                    "Reconnect already in progress for {}",
                    server.name
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
            }
        }
        let _guard = ActiveGuard {
            active: self.active.clone(),
            key,
        };

        self.run_reconnect(server).await
    }

    async fn run_reconnect(&self, server: &ServerEntry) -> RepoResult<OAuthResult> {
        // OAuth explicitly disabled: stale data must not survive to
        // influence a later run.
        if server.use_oauth == Some(false) {
            self.data.clear_oauth_data(server.id, &server.name).await?;
            debug!("[OAuth] OAuth disabled for {}, cleared stored data", server.name);
            return Ok(OAuthResult::ready(server.config.clone(), None));
        }

        // Legacy entry with no OAuth intent and no token snapshot: plain
        // connection, same cleanup.
        if server.use_oauth != Some(true) && server.oauth_tokens.is_none() {
            self.data.clear_oauth_data(server.id, &server.name).await?;
            debug!(
                "[OAuth] No OAuth intent for {}, connecting without auth",
                server.name
            );
            return Ok(OAuthResult::ready(server.config.clone(), None));
        }

        // A token snapshot means a flow once completed; silent refresh is
        // the cheapest path back to a working connection.
        if server.oauth_tokens.is_some() {
            match self.refresh.refresh_oauth_tokens(server).await? {
                RefreshOutcome::Refreshed { config } => {
                    let tokens = self.data.get_stored_tokens(server.id, &server.name).await?;
                    info!("[OAuth] Token refresh succeeded for {}", server.name);
                    return Ok(OAuthResult::ready(config, tokens));
                }
                RefreshOutcome::Failed => {
                    info!(
                        "[OAuth] Token refresh failed for {}, starting fresh authorization",
                        server.name
                    );
                }
            }
        }

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
                warn!("[OAuth] No server URL available for {}", server.name);
                return Ok(OAuthResult::error("OAuth refresh failed and no URL present"));
            }
        };

        let stored_tokens = self.data.get_stored_tokens(server.id, &server.name).await?;
        let registration = self
            .data
            .get_client_registration(server.id, &server.name)
            .await?;
        let oauth_config = self.data.get_oauth_config(server.id, &server.name).await?;

        // client_id precedence: entry snapshot, stored tokens, stored
        // registration. Secrets and scopes come from stored client/config
        // data only, never from a token set.
        let mut options = InitiationOptions::new(server.id, server.name.clone(), server_url);
        options.client_id = server
            .oauth_tokens
            .as_ref()
            .and_then(|t| t.client_id.clone())
            .or_else(|| stored_tokens.as_ref().and_then(|t| t.client_id.clone()))
            .or_else(|| registration.as_ref().map(|r| r.client_id.clone()));
        options.client_secret = registration
            .as_ref()
            .and_then(|r| r.client_secret.clone());
        options.scopes = oauth_config.and_then(|c| c.scopes);

        match self.initiator.initiate_oauth(options).await? {
            InitiationOutcome::Connected { config } => {
                let tokens = self.data.get_stored_tokens(server.id, &server.name).await?;
                info!("[OAuth] Authorization completed inline for {}", server.name);
                Ok(OAuthResult::ready(config, tokens))
            }
            InitiationOutcome::RedirectPending => Ok(OAuthResult::Redirect),
            InitiationOutcome::Failed { message } => {
                warn!("[OAuth] Authorization failed for {}: {}", server.name, message);
                Ok(OAuthResult::error(message))
            }
        }
    }

    /// Reconnect every saved server sequentially at startup.
    ///
    /// Stops at the first `Redirect`: the page is navigating away, and any
    /// further flow would race the handoff.
    pub async fn reconnect_all_on_startup(
        &self,
        servers: &[ServerEntry],
    ) -> RepoResult<StartupReconnectSummary> {
        let mut summary = StartupReconnectSummary::default();
        for server in servers {
            summary.servers_checked += 1;
            match self.ensure_authorized_for_reconnect(server).await? {
                OAuthResult::Ready { .. } => summary.ready += 1,
                OAuthResult::Redirect => {
                    summary.redirect_pending = true;
                    info!(
                        "[OAuth] {} needs interactive authorization, stopping startup sweep",
                        server.name
                    );
                    break;
                }
                OAuthResult::Error { message } => {
                    warn!(
                        "[OAuth] Startup reconnect failed for {}: {}",
                        server.name, message
                    );
                    summary.errors += 1;
                }
            }
        }
        info!(
            "[OAuth] Startup reconnect: {} checked, {} ready, {} errors",
            summary.servers_checked, summary.ready, summary.errors
        );
        Ok(summary)
    }
}
