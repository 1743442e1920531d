//! OAuth callback dispatch across browser contexts.
//!
//! The authorization server redirects to the callback URL, but that page
//! load may happen in the tab that started the flow, in an unrelated tab,
//! or in a foreign browser while the flow belongs to the desktop shell.
//! The dispatcher tells these apart from the URL and the session markers
//! and routes the authorization code accordingly.

use std::sync::Arc;
use std::time::Duration;

use mcplens_core::{branding, KeyValueRepository, Navigator, RepoResult};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::session::{PendingFlow, SessionFlowStore, StagedAuthorization};

/// How long the generic-browser page waits for the deep-link handoff
/// before giving up and navigating home.
const DESKTOP_FALLBACK_DELAY: Duration = Duration::from_secs(5);

/// Query parameters extracted from a callback URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub platform: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                "platform" => params.platform = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Provider error combined into one display string, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|error| {
            match &self.error_description {
                Some(desc) => format!("{}: {}", error, desc),
                None => error.clone(),
            }
        })
    }

    /// Whether the flow was started by the desktop shell.
    pub fn is_desktop(&self) -> bool {
        self.platform.as_deref() == Some("desktop")
    }
}

/// Where a callback ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackDisposition {
    /// The flow started in this session; the code is staged and the next
    /// orchestrator run for this server completes the exchange.
    SameSession {
        server_id: Uuid,
        server_name: String,
        server_url: String,
    },
    /// The flow started in another context; the user copies the code back
    /// by hand. The callback URL is left untouched.
    ManualCopy { code: String },
    /// The flow belongs to the desktop shell; the code was forwarded over
    /// the custom URI scheme and the caller shows a redirecting state.
    DesktopHandoff { deep_link: String },
    Failed { message: String },
}

fn state_short(state: &str) -> &str {
    state.get(..8).unwrap_or(state)
}

/// Routes provider callbacks back into the flow.
#[derive(Clone)]
pub struct CallbackDispatcher {
    session: SessionFlowStore,
    navigator: Arc<dyn Navigator>,
}

impl CallbackDispatcher {
    pub fn new(session: Arc<dyn KeyValueRepository>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session: SessionFlowStore::new(session),
            navigator,
        }
    }

    /// Handle a callback landing as a regular page load.
    pub async fn dispatch(&self, callback_url: &str) -> RepoResult<CallbackDisposition> {
        let parsed = match Url::parse(callback_url) {
            Ok(url) => url,
            Err(e) => {
                return Ok(CallbackDisposition::Failed {
                    message: format!("Invalid callback URL: {}", e),
                });
            }
        };
        let params = CallbackParams::from_url(&parsed);

        if let Some(message) = params.error_message() {
            warn!("[Callback] Authorization server returned error: {}", message);
            return Ok(CallbackDisposition::Failed { message });
        }
        let code = match params.code.clone() {
            Some(code) => code,
            None => {
                warn!("[Callback] Callback carried no code and no error");
                return Ok(CallbackDisposition::Failed {
                    message: "Missing authorization code".to_string(),
                });
            }
        };

        // Desktop flows are detected from the URL marker alone; this page
        // may be a foreign browser with no session markers at all.
        if params.is_desktop() {
            return self.desktop_handoff(&parsed, &params, &code).await;
        }

        match self.session.load_pending().await? {
            Some(pending) => {
                let disposition = self.validate_and_stage(pending, &params, &code).await?;
                if matches!(disposition, CallbackDisposition::SameSession { .. }) {
                    // Drop the raw callback URL from history so a reload
                    // cannot replay the code.
                    let mut clean = parsed.clone();
                    clean.set_query(None);
                    clean.set_fragment(None);
                    self.navigator.replace_history(clean.as_str()).await?;
                }
                Ok(disposition)
            }
            None => {
                info!("[Callback] No pending flow in this session, showing code for manual copy");
                Ok(CallbackDisposition::ManualCopy { code })
            }
        }
    }

    /// Handle a callback arriving over the custom URI scheme inside the
    /// desktop shell. Same validation and staging as a same-session
    /// callback, but there is no browser history to rewrite.
    pub async fn dispatch_deep_link(&self, url: &str) -> RepoResult<CallbackDisposition> {
        if !branding::is_deep_link_callback(url) {
            warn!("[DeepLink] Ignoring unrecognized deep link: {}", url);
            return Ok(CallbackDisposition::Failed {
                message: format!("Unsupported deep link: {}", url),
            });
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Ok(CallbackDisposition::Failed {
                    message: format!("Invalid deep link: {}", e),
                });
            }
        };
        let params = CallbackParams::from_url(&parsed);
        debug!(
            "[DeepLink] OAuth callback received (state: {}...)",
            params.state.as_deref().map(state_short).unwrap_or("none")
        );

        if let Some(message) = params.error_message() {
            warn!("[DeepLink] Authorization server returned error: {}", message);
            return Ok(CallbackDisposition::Failed { message });
        }
        let code = match params.code.clone() {
            Some(code) => code,
            None => {
                return Ok(CallbackDisposition::Failed {
                    message: "Missing authorization code".to_string(),
                });
            }
        };

        match self.session.load_pending().await? {
            Some(pending) => self.validate_and_stage(pending, &params, &code).await,
            None => {
                info!("[DeepLink] No pending flow for deep link, showing code for manual copy");
                Ok(CallbackDisposition::ManualCopy { code })
            }
        }
    }

    async fn desktop_handoff(
        &self,
        parsed: &Url,
        params: &CallbackParams,
        code: &str,
    ) -> RepoResult<CallbackDisposition> {
        let mut query = format!("code={}", urlencoding::encode(code));
        if let Some(state) = &params.state {
            query.push_str(&format!("&state={}", urlencoding::encode(state)));
        }
        let deep_link = branding::deep_link_callback_uri(&query);

        info!("[Callback] Forwarding desktop OAuth callback over deep link");
        self.navigator.navigate(&deep_link).await?;

        // If the shell never picks the link up, return the stranded page
        // to the home screen after a bounded wait.
        let mut home = parsed.clone();
        home.set_query(None);
        home.set_fragment(None);
        home.set_path("/");
        let navigator = self.navigator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DESKTOP_FALLBACK_DELAY).await;
            if let Err(e) = navigator.navigate(home.as_str()).await {
                debug!("[Callback] Fallback navigation failed: {}", e);
            }
        });

        Ok(CallbackDisposition::DesktopHandoff { deep_link })
    }

    async fn validate_and_stage(
        &self,
        pending: PendingFlow,
        params: &CallbackParams,
        code: &str,
    ) -> RepoResult<CallbackDisposition> {
        let state = params.state.as_deref().unwrap_or("");
        if state != pending.state {
            warn!(
                "[Callback] State mismatch for {} (got {}..., have {}...)",
                pending.server_name,
                state_short(state),
                state_short(&pending.state)
            );
            return Ok(CallbackDisposition::Failed {
                message: "State mismatch in OAuth callback".to_string(),
            });
        }

        self.session
            .stage_authorization(
                pending.server_id,
                &pending.server_name,
                &StagedAuthorization {
                    code: code.to_string(),
                    pkce_verifier: pending.pkce_verifier.clone(),
                },
            )
            .await?;
        self.session.clear_pending().await?;

        info!(
            "[Callback] Staged authorization code for {}",
            pending.server_name
        );
        Ok(CallbackDisposition::SameSession {
            server_id: pending.server_id,
            server_name: pending.server_name,
            server_url: pending.server_url,
        })
    }
}
