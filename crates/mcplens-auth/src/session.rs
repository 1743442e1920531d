//! Session-scoped markers for in-flight authorization flows.
//!
//! Before navigating to the authorization server, the initiator writes a
//! pending-flow marker into session storage. The callback dispatcher uses
//! it to recognize a same-session return, validate the CSRF state, and
//! stage the authorization code for the next orchestrator run. A callback
//! landing in a context without these markers is a cross-tab return.

use std::sync::Arc;

use mcplens_core::{KeyValueRepository, RepoResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Key for the pending-flow marker JSON.
pub const PENDING_FLOW_KEY: &str = "mcp-oauth-flow";

/// Flag key set alongside the marker while a flow is in progress.
pub const PENDING_FLAG_KEY: &str = "mcp-oauth-pending";

/// Key prefix for staged authorization codes.
const STAGED_CODE_PREFIX: &str = "mcp-oauth-code";

/// Everything the callback dispatcher needs to finish a flow that left
/// this session: which server started it, the CSRF state to match, and
/// the PKCE verifier for the eventual code exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingFlow {
    pub server_id: Uuid,
    pub server_name: String,
    pub server_url: String,
    pub state: String,
    pub pkce_verifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// An authorization code staged by the dispatcher, consumed by the
/// initiator's resumption path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedAuthorization {
    pub code: String,
    pub pkce_verifier: String,
}

fn staged_key(server_id: Uuid, server_name: &str) -> String {
    format!("{}.{}.{}", STAGED_CODE_PREFIX, server_id, server_name)
}

/// Pending-flow and staged-code storage over the session surface.
#[derive(Clone)]
pub struct SessionFlowStore {
    session: Arc<dyn KeyValueRepository>,
}

impl SessionFlowStore {
    pub fn new(session: Arc<dyn KeyValueRepository>) -> Self {
        Self { session }
    }

    /// Write the pending-flow marker and the in-progress flag. Must happen
    /// before the navigation away, or the callback cannot be matched.
    pub async fn save_pending(&self, flow: &PendingFlow) -> RepoResult<()> {
        let json = serde_json::to_string(flow)?;
        self.session.set(PENDING_FLOW_KEY, &json).await?;
        self.session.set(PENDING_FLAG_KEY, "true").await?;
        debug!("[TokenStore] Saved pending flow for {}", flow.server_name);
        Ok(())
    }

    pub async fn load_pending(&self) -> RepoResult<Option<PendingFlow>> {
        match self.session.get(PENDING_FLOW_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(flow) => Ok(Some(flow)),
                Err(e) => {
                    warn!("[TokenStore] Ignoring corrupt pending flow marker: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn clear_pending(&self) -> RepoResult<()> {
        self.session.delete(PENDING_FLOW_KEY).await?;
        self.session.delete(PENDING_FLAG_KEY).await?;
        Ok(())
    }

    /// Stage an authorization code for exactly one `(id, name)` pair.
    pub async fn stage_authorization(
        &self,
        server_id: Uuid,
        server_name: &str,
        staged: &StagedAuthorization,
    ) -> RepoResult<()> {
        let json = serde_json::to_string(staged)?;
        self.session
            .set(&staged_key(server_id, server_name), &json)
            .await
    }

    /// Read and remove a staged authorization, if one exists. Codes are
    /// single-use; consuming on read keeps a failed exchange from being
    /// replayed with the same code.
    pub async fn take_staged_authorization(
        &self,
        server_id: Uuid,
        server_name: &str,
    ) -> RepoResult<Option<StagedAuthorization>> {
        let key = staged_key(server_id, server_name);
        match self.session.get(&key).await? {
            Some(raw) => {
                self.session.delete(&key).await?;
                match serde_json::from_str(&raw) {
                    Ok(staged) => Ok(Some(staged)),
                    Err(e) => {
                        warn!("[TokenStore] Ignoring corrupt staged authorization: {}", e);
                        Ok(None)
                    }
                }
            }
            None => Ok(None),
        }
    }
}
