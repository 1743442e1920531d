//! McpLens Auth
//!
//! OAuth 2.1 connection and reconnection orchestration for saved MCP
//! servers:
//! - Decision logic: skip auth, silent refresh, or fresh authorization
//! - Authorization-code + PKCE flow with dynamic client registration
//! - Metadata discovery with origin fallback
//! - Key-scoped token persistence with a legacy key migration path
//! - Callback dispatch across tabs, sessions, and the desktop shell

pub mod callback;
pub mod discovery;
pub mod flow;
pub mod initiator;
pub mod navigator;
pub mod orchestrator;
pub mod pkce;
pub mod refresh;
pub mod registration;
pub mod session;
pub mod token_store;

pub use callback::{CallbackDispatcher, CallbackDisposition, CallbackParams};
pub use discovery::{discovery_candidates, extract_origin, OAuthDiscovery, OAuthMetadata};
pub use flow::{generate_state, OAuthFlow, TokenResponse};
pub use initiator::{AuthorizationInitiator, InitiationOptions, InitiationOutcome};
pub use navigator::SystemBrowserNavigator;
pub use orchestrator::{ReconnectOrchestrator, StartupReconnectSummary};
pub use pkce::{challenge_for, PkceChallenge};
pub use refresh::{RefreshOutcome, TokenRefreshClient};
pub use registration::{
    ClientRegistrar, ClientRegistrationRequest, ClientRegistrationResponse,
    RegistrationErrorResponse,
};
pub use session::{PendingFlow, SessionFlowStore, StagedAuthorization};
pub use token_store::{OAuthDataKind, OAuthDataStore};
