//! System-browser implementation of the navigation port.

use async_trait::async_trait;
use mcplens_core::{Navigator, RepoResult};
use tracing::debug;

/// Opens URLs in the user's default browser. History rewriting only makes
/// sense inside an embedding shell, so it is a no-op here.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowserNavigator;

impl SystemBrowserNavigator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Navigator for SystemBrowserNavigator {
    async fn navigate(&self, url: &str) -> RepoResult<()> {
        debug!("Opening {} in system browser", url);
        open::that(url).map_err(|e| anyhow::anyhow!("Failed to open browser: {}", e))
    }

    async fn replace_history(&self, _url: &str) -> RepoResult<()> {
        Ok(())
    }
}
