//! The orchestrator result union
//!
//! Every reconnect decision normalizes into exactly one of these three
//! variants. The UI branches on nothing else: `Ready` proceeds with the
//! returned config, `Redirect` shows an authorizing state and stops,
//! `Error` surfaces the message without auto-retrying.

use serde::{Deserialize, Serialize};

use crate::domain::server::TransportConfig;
use crate::domain::tokens::StoredTokenSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OAuthResult {
    /// Connection may proceed immediately with this config and, when a
    /// flow or refresh produced them, the token set now in effect.
    Ready {
        config: TransportConfig,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tokens: Option<StoredTokenSet>,
    },

    /// The browser navigation has been handed to the authorization
    /// server. The flow is suspended, not failed; continuation happens
    /// via the callback dispatcher on a later page load.
    Redirect,

    /// The flow could not proceed and no safe fallback exists.
    Error { message: String },
}

impl OAuthResult {
    pub fn ready(config: TransportConfig, tokens: Option<StoredTokenSet>) -> Self {
        OAuthResult::Ready { config, tokens }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OAuthResult::Error {
            message: message.into(),
        }
    }
}
