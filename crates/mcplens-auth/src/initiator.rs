//! Fresh authorization flows and same-session resumption.

use std::sync::Arc;

use mcplens_core::{
    branding, KeyValueRepository, Navigator, RepoResult, StoredOAuthConfig, StoredOAuthMetadata,
    StoredTokenSet, TransportConfig,
};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::discovery::OAuthDiscovery;
use crate::flow::{generate_state, OAuthFlow};
use crate::pkce::PkceChallenge;
use crate::registration::{ClientRegistrar, ClientRegistrationRequest};
use crate::session::{PendingFlow, SessionFlowStore, StagedAuthorization};
use crate::token_store::OAuthDataStore;

/// Where the authorization server sends the user back to.
const DEFAULT_REDIRECT_BASE: &str = "http://localhost:6274";

/// Inputs for one authorization attempt. Credential fields follow a strict
/// precedence decided by the caller: `client_id` may come from a token set
/// or a stored registration, but `client_secret` and `scopes` only ever
/// come from stored client/config data.
#[derive(Debug, Clone)]
pub struct InitiationOptions {
    pub server_id: Uuid,
    pub server_name: String,
    pub server_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scopes: Option<Vec<String>>,
}

impl InitiationOptions {
    pub fn new(
        server_id: Uuid,
        server_name: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            server_id,
            server_name: server_name.into(),
            server_url: server_url.into(),
            client_id: None,
            client_secret: None,
            scopes: None,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }
}

/// Outcome of an initiation attempt.
#[derive(Debug, Clone)]
pub enum InitiationOutcome {
    /// A staged authorization code was exchanged without leaving the page.
    Connected { config: TransportConfig },
    /// The browser has been handed to the authorization server; the flow
    /// continues via the callback dispatcher on a later page load.
    RedirectPending,
    Failed { message: String },
}

/// Starts (or resumes) the authorization-code flow for a server.
#[derive(Clone)]
pub struct AuthorizationInitiator {
    data: OAuthDataStore,
    session: SessionFlowStore,
    discovery: OAuthDiscovery,
    flow: OAuthFlow,
    registrar: ClientRegistrar,
    navigator: Arc<dyn Navigator>,
    redirect_base: String,
    desktop_platform: bool,
}

impl AuthorizationInitiator {
    pub fn new(
        storage: Arc<dyn KeyValueRepository>,
        session: Arc<dyn KeyValueRepository>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            data: OAuthDataStore::new(storage),
            session: SessionFlowStore::new(session),
            discovery: OAuthDiscovery::new(),
            flow: OAuthFlow::new(),
            registrar: ClientRegistrar::new(),
            navigator,
            redirect_base: DEFAULT_REDIRECT_BASE.to_string(),
            desktop_platform: false,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.discovery = OAuthDiscovery::with_client(http.clone());
        self.flow = OAuthFlow::with_client(http.clone());
        self.registrar = ClientRegistrar::with_client(http);
        self
    }

    pub fn with_redirect_base(mut self, base: impl Into<String>) -> Self {
        self.redirect_base = base.into();
        self
    }

    /// Mark redirect URIs with `platform=desktop` so a callback landing in
    /// a foreign browser can hand the code back over the deep link scheme.
    pub fn with_desktop_platform(mut self, enabled: bool) -> Self {
        self.desktop_platform = enabled;
        self
    }

    /// Start or resume an authorization flow.
    pub async fn initiate_oauth(&self, options: InitiationOptions) -> RepoResult<InitiationOutcome> {
        if let Err(e) = Url::parse(&options.server_url) {
            warn!(
                "[OAuth] Invalid server URL for {}: {}",
                options.server_name, e
            );
            return Ok(InitiationOutcome::Failed {
                message: format!("Invalid server URL: {}", e),
            });
        }

        let config = self
            .data
            .get_oauth_config(options.server_id, &options.server_name)
            .await?;
        let cached = config.as_ref().and_then(|c| c.metadata.clone());
        let metadata = match cached {
            Some(metadata) => metadata,
            None => match self.discovery.discover(&options.server_url).await {
                Ok(wire) => {
                    let metadata = wire.into_stored();
                    let updated = StoredOAuthConfig {
                        scopes: config.and_then(|c| c.scopes),
                        metadata: Some(metadata.clone()),
                    };
                    self.data
                        .save_oauth_config(options.server_id, &updated)
                        .await?;
                    metadata
                }
                Err(e) => {
                    warn!(
                        "[OAuth] Metadata discovery failed for {}: {}",
                        options.server_name, e
                    );
                    return Ok(InitiationOutcome::Failed {
                        message: format!("OAuth discovery failed: {}", e),
                    });
                }
            },
        };

        let registration = self
            .data
            .get_client_registration(options.server_id, &options.server_name)
            .await?;
        let known_client_id = options
            .client_id
            .clone()
            .or_else(|| registration.as_ref().map(|r| r.client_id.clone()));
        let client_secret = options
            .client_secret
            .clone()
            .or_else(|| registration.as_ref().and_then(|r| r.client_secret.clone()));

        // A code staged by the callback dispatcher means the user already
        // authorized in this session; finish without another redirect.
        if let Some(staged) = self
            .session
            .take_staged_authorization(options.server_id, &options.server_name)
            .await?
        {
            return self
                .exchange_staged(&options, &metadata, known_client_id, client_secret, staged)
                .await;
        }

        let scopes = self.resolve_scopes(&options, &metadata);

        let redirect_uri = self.build_redirect_uri();
        let client_id = match known_client_id {
            Some(client_id) => client_id,
            None => match &metadata.registration_endpoint {
                Some(endpoint) => {
                    let request =
                        ClientRegistrationRequest::new(&redirect_uri).with_scopes(&scopes);
                    match self.registrar.register(endpoint, &request).await {
                        Ok(response) => {
                            let stored = response.into_stored();
                            self.data
                                .save_client_registration(options.server_id, &stored)
                                .await?;
                            info!(
                                "[OAuth] Registered client {} for {}",
                                stored.client_id, options.server_name
                            );
                            stored.client_id
                        }
                        Err(e) => {
                            warn!(
                                "[OAuth] Client registration failed for {}: {}",
                                options.server_name, e
                            );
                            return Ok(InitiationOutcome::Failed {
                                message: e.to_string(),
                            });
                        }
                    }
                }
                None => {
                    return Ok(InitiationOutcome::Failed {
                        message: "No client credentials and no registration endpoint available"
                            .to_string(),
                    });
                }
            },
        };

        let state = generate_state();
        let pkce = PkceChallenge::generate();

        // The marker must be durable before the page goes away.
        let pending = PendingFlow {
            server_id: options.server_id,
            server_name: options.server_name.clone(),
            server_url: options.server_url.clone(),
            state: state.clone(),
            pkce_verifier: pkce.verifier.clone(),
            platform: self.desktop_platform.then(|| "desktop".to_string()),
        };
        self.session.save_pending(&pending).await?;

        let auth_url = self.flow.build_authorization_url(
            &metadata,
            &client_id,
            &redirect_uri,
            &scopes,
            &pkce,
            &state,
            Some(&options.server_url),
        )?;

        info!(
            "[OAuth] Redirecting {} to authorization server",
            options.server_name
        );
        if let Err(e) = self.navigator.navigate(&auth_url).await {
            self.session.clear_pending().await?;
            warn!(
                "[OAuth] Could not open authorization page for {}: {}",
                options.server_name, e
            );
            return Ok(InitiationOutcome::Failed {
                message: format!("Failed to open authorization page: {}", e),
            });
        }

        Ok(InitiationOutcome::RedirectPending)
    }

    async fn exchange_staged(
        &self,
        options: &InitiationOptions,
        metadata: &StoredOAuthMetadata,
        client_id: Option<String>,
        client_secret: Option<String>,
        staged: StagedAuthorization,
    ) -> RepoResult<InitiationOutcome> {
        let client_id = match client_id {
            Some(client_id) => client_id,
            None => {
                warn!(
                    "[OAuth] Staged code for {} but no client registration",
                    options.server_name
                );
                return Ok(InitiationOutcome::Failed {
                    message: "No client registration available for code exchange".to_string(),
                });
            }
        };

        debug!(
            "[OAuth] Exchanging staged authorization code for {}",
            options.server_name
        );
        let response = match self
            .flow
            .exchange_code(
                metadata,
                &client_id,
                client_secret.as_deref(),
                &staged.code,
                &staged.pkce_verifier,
                &self.build_redirect_uri(),
                Some(&options.server_url),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "[OAuth] Code exchange failed for {}: {}",
                    options.server_name, e
                );
                return Ok(InitiationOutcome::Failed {
                    message: e.to_string(),
                });
            }
        };

        let scopes = response
            .scope
            .as_ref()
            .map(|s| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .or_else(|| options.scopes.clone());
        let tokens = StoredTokenSet {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: response.expires_at(),
            client_id: Some(client_id),
            client_secret,
            scopes,
        };
        self.data.save_tokens(options.server_id, &tokens).await?;

        info!("[OAuth] Authorization completed for {}", options.server_name);
        Ok(InitiationOutcome::Connected {
            config: TransportConfig::http(&options.server_url)
                .with_bearer_token(&response.access_token),
        })
    }

    fn resolve_scopes(
        &self,
        options: &InitiationOptions,
        metadata: &StoredOAuthMetadata,
    ) -> Vec<String> {
        if let Some(scopes) = &options.scopes {
            if !scopes.is_empty() {
                return scopes.clone();
            }
        }
        match &metadata.scopes_supported {
            Some(advertised) if !advertised.is_empty() => {
                info!(
                    "[OAuth] Using scopes advertised by {}: {:?}",
                    options.server_name, advertised
                );
                advertised.clone()
            }
            _ => {
                info!(
                    "[OAuth] No scopes configured for {}, requesting none",
                    options.server_name
                );
                Vec::new()
            }
        }
    }

    fn build_redirect_uri(&self) -> String {
        let base = self.redirect_base.trim_end_matches('/');
        let mut uri = format!("{}{}", base, branding::oauth_callback_path());
        if self.desktop_platform {
            uri.push_str("?platform=desktop");
        }
        uri
    }
}
