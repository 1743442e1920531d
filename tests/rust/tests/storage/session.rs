//! Session flow store tests
//!
//! SessionFlowStore over the real in-memory session store, the pairing
//! the browser runtime uses for pending-flow markers.

use std::sync::Arc;

use mcplens_auth::session::{PENDING_FLAG_KEY, PENDING_FLOW_KEY};
use mcplens_auth::{PendingFlow, SessionFlowStore, StagedAuthorization};
use mcplens_core::KeyValueRepository;
use mcplens_storage::InMemorySessionStore;
use pretty_assertions::assert_eq;
use tests::fixtures;

fn pending_flow() -> PendingFlow {
    PendingFlow {
        server_id: fixtures::random_id(),
        server_name: "demo".to_string(),
        server_url: "https://mcp.example.com/mcp".to_string(),
        state: "state-1".to_string(),
        pkce_verifier: "verifier-1".to_string(),
        platform: None,
    }
}

#[tokio::test]
async fn test_pending_flow_round_trips_with_flag() {
    let session = Arc::new(InMemorySessionStore::new());
    let store = SessionFlowStore::new(session.clone());

    let flow = pending_flow();
    store.save_pending(&flow).await.unwrap();

    assert_eq!(store.load_pending().await.unwrap(), Some(flow));
    assert_eq!(
        session.get(PENDING_FLAG_KEY).await.unwrap(),
        Some("true".to_string())
    );
}

#[tokio::test]
async fn test_clear_pending_removes_marker_and_flag() {
    let session = Arc::new(InMemorySessionStore::new());
    let store = SessionFlowStore::new(session.clone());

    store.save_pending(&pending_flow()).await.unwrap();
    store.clear_pending().await.unwrap();

    assert_eq!(store.load_pending().await.unwrap(), None);
    assert_eq!(session.get(PENDING_FLOW_KEY).await.unwrap(), None);
    assert_eq!(session.get(PENDING_FLAG_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_corrupt_pending_marker_reads_as_absent() {
    let session = Arc::new(InMemorySessionStore::new());
    session.set(PENDING_FLOW_KEY, "not json").await.unwrap();

    let store = SessionFlowStore::new(session);
    assert_eq!(store.load_pending().await.unwrap(), None);
}

#[tokio::test]
async fn test_staged_authorization_is_single_use() {
    let session = Arc::new(InMemorySessionStore::new());
    let store = SessionFlowStore::new(session);

    let id = fixtures::random_id();
    let staged = StagedAuthorization {
        code: "auth-code".to_string(),
        pkce_verifier: "verifier-1".to_string(),
    };
    store
        .stage_authorization(id, "demo", &staged)
        .await
        .unwrap();

    let first = store.take_staged_authorization(id, "demo").await.unwrap();
    assert_eq!(first, Some(staged));

    // Consumed on read; a retry cannot replay the same code
    let second = store.take_staged_authorization(id, "demo").await.unwrap();
    assert_eq!(second, None);
}

#[tokio::test]
async fn test_staged_codes_are_scoped_per_server() {
    let session = Arc::new(InMemorySessionStore::new());
    let store = SessionFlowStore::new(session);

    let a = fixtures::random_id();
    let b = fixtures::random_id();
    let staged = StagedAuthorization {
        code: "code-a".to_string(),
        pkce_verifier: "v".to_string(),
    };
    store.stage_authorization(a, "demo", &staged).await.unwrap();

    assert_eq!(store.take_staged_authorization(b, "demo").await.unwrap(), None);
    assert_eq!(
        store.take_staged_authorization(a, "other").await.unwrap(),
        None
    );
    assert!(store
        .take_staged_authorization(a, "demo")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_sessions_do_not_share_markers() {
    // Two session stores model two browser contexts. A flow started in
    // one is invisible to the other, which is how cross-tab callbacks
    // are recognized.
    let tab_a = SessionFlowStore::new(Arc::new(InMemorySessionStore::new()));
    let tab_b = SessionFlowStore::new(Arc::new(InMemorySessionStore::new()));

    tab_a.save_pending(&pending_flow()).await.unwrap();

    assert!(tab_a.load_pending().await.unwrap().is_some());
    assert_eq!(tab_b.load_pending().await.unwrap(), None);
}
