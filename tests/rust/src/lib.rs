//! Shared test utilities and fixtures for McpLens integration tests.

pub use mcplens_core::{
    ClientRegistration, OAuthResult, ServerEntry, StoredOAuthConfig, StoredOAuthMetadata,
    StoredTokenSet, TransportConfig,
};

pub use mocks::{FailingKeyValueStore, MemoryKeyValueStore, RecordingNavigator};

/// Test fixture utilities
pub mod fixtures {
    use super::*;
    use uuid::Uuid;

    /// Create a saved server entry with an HTTP transport
    pub fn test_server(name: &str, url: &str) -> ServerEntry {
        ServerEntry::new(name, TransportConfig::http(url))
    }

    /// Create a saved server entry with a stdio transport (no URL)
    pub fn test_stdio_server(name: &str) -> ServerEntry {
        ServerEntry::new(
            name,
            TransportConfig::Stdio {
                command: "npx".to_string(),
                args: vec!["-y".to_string(), "@example/server".to_string()],
                env: Default::default(),
            },
        )
    }

    /// Create a token set with both an access and a refresh token
    pub fn test_tokens(access: &str, refresh: &str) -> StoredTokenSet {
        StoredTokenSet::new(access)
            .with_refresh_token(refresh)
            .with_client_id("client-1")
    }

    /// Authorization server metadata pointing all endpoints at `base`
    pub fn test_metadata(base: &str) -> StoredOAuthMetadata {
        StoredOAuthMetadata {
            authorization_endpoint: format!("{}/authorize", base),
            token_endpoint: format!("{}/token", base),
            registration_endpoint: Some(format!("{}/register", base)),
            issuer: Some(base.to_string()),
            scopes_supported: None,
            additional_fields: Default::default(),
        }
    }

    /// Stored OAuth config with cached metadata for `base`
    pub fn test_config_with_metadata(base: &str) -> StoredOAuthConfig {
        StoredOAuthConfig {
            scopes: None,
            metadata: Some(test_metadata(base)),
        }
    }

    /// Generate a random UUID
    pub fn random_id() -> Uuid {
        Uuid::new_v4()
    }
}

/// Database test helpers
pub mod db {
    use mcplens_storage::Database;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Database file name
    const DB_FILE: &str = "mcplens.db";

    /// Create a temporary database for testing
    pub struct TestDatabase {
        pub db: Database,
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestDatabase {
        /// Create a new test database in a temporary directory
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db_path = temp_dir.path().join(DB_FILE);
            let db = Database::open(&db_path).expect("Failed to open test database");
            Self {
                db,
                db_path,
                _temp_dir: temp_dir,
            }
        }

        /// Create an in-memory database for fast tests
        pub fn in_memory() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let db = Database::open_in_memory().expect("Failed to open in-memory database");
            Self {
                db,
                db_path: PathBuf::new(),
                _temp_dir: temp_dir,
            }
        }

        /// Get the database directory path
        pub fn path(&self) -> &Path {
            self._temp_dir.path()
        }

        /// Get the full database file path
        pub fn db_path(&self) -> &Path {
            &self.db_path
        }
    }

    impl Default for TestDatabase {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Async test helpers
pub mod async_helpers {
    use std::time::Duration;
    use tokio::time::timeout;

    /// Run an async operation with a timeout
    pub async fn with_timeout<F, T>(duration: Duration, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        timeout(duration, f).await.expect("Operation timed out")
    }

    /// Default test timeout (5 seconds)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
}
