//! Top-level navigation port
//!
//! The orchestrator leaves the page in exactly two places: toward the
//! authorization server when a fresh flow starts, and toward the custom
//! URI scheme when a callback is handed to the desktop shell. Both go
//! through this trait so tests can record navigations instead of opening
//! a browser.

use async_trait::async_trait;

use crate::repository::RepoResult;

#[async_trait]
pub trait Navigator: Send + Sync {
    /// Perform a full top-level navigation to `url`
    async fn navigate(&self, url: &str) -> RepoResult<()>;

    /// Replace the current history entry with `url`, where the embedding
    /// shell supports it. Implementations without history control (the
    /// system browser) treat this as a no-op.
    async fn replace_history(&self, url: &str) -> RepoResult<()>;
}
