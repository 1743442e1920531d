//! McpLens Core
//!
//! Domain types and port traits for the McpLens OAuth reconnection
//! orchestrator. This crate holds no I/O of its own: persistence and
//! navigation are defined here as traits and implemented by
//! `mcplens-storage` and `mcplens-auth`.
//!
//! # Modules
//!
//! - `domain` - server entries, token sets, and the orchestrator result union
//! - `repository` - async storage port traits (`KeyValueRepository`)
//! - `navigation` - the top-level navigation port (`Navigator`)
//! - `branding` - centralized product naming and deep-link helpers

pub mod branding;
pub mod domain;
pub mod navigation;
pub mod repository;

// Re-export commonly used types at crate root
pub use domain::*;
pub use navigation::*;
pub use repository::*;
