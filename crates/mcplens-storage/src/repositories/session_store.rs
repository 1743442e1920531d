//! In-memory session-scoped storage.
//!
//! The sessionStorage-equivalent surface: pending-flow markers written
//! before navigating away live here and vanish with the process. A
//! callback landing in a different browser context therefore sees an
//! empty session store, which is exactly how cross-tab completion is
//! detected.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use mcplens_core::KeyValueRepository;
use tokio::sync::RwLock;

/// Session-scoped key-value store backed by a plain HashMap.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueRepository for InMemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<(String, String)>> {
        let entries = self.entries.read().await;
        let mut rows: Vec<_> = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let entries = self.entries.read().await;
        let mut rows: Vec<_> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }
}
