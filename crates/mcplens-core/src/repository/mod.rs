//! Repository traits for data access
//!
//! These traits define the storage surfaces the orchestrator depends on
//! without specifying the implementation (SQLite, in-memory, etc.)

use async_trait::async_trait;

/// Result type for repository operations
pub type RepoResult<T> = anyhow::Result<T>;

/// Key-value storage port.
///
/// Two surfaces implement this: the persistent store (SQLite-backed)
/// holding tokens and client info across launches, and the session-scoped
/// store (in-memory) holding pending-flow markers that must not outlive
/// the browsing session. Values are human-inspectable JSON strings.
///
/// Keys use dot-notation namespacing:
/// - `mcp-tokens.<server-id>` - persisted token set
/// - `mcp-client.<server-id>` - dynamic client registration
/// - `mcp-oauth-config.<server-id>` - scopes and cached discovery metadata
#[async_trait]
pub trait KeyValueRepository: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Set a value (insert or update)
    async fn set(&self, key: &str, value: &str) -> RepoResult<()>;

    /// Delete a value by key
    async fn delete(&self, key: &str) -> RepoResult<()>;

    /// Get all entries (for export/debug)
    async fn list(&self) -> RepoResult<Vec<(String, String)>>;

    /// Get all entries with a given key prefix (e.g., "mcp-tokens.")
    async fn list_by_prefix(&self, prefix: &str) -> RepoResult<Vec<(String, String)>>;
}
