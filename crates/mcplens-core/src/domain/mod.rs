//! Domain entities and value objects
//!
//! This module contains the domain-level types for McpLens:
//! - Server entries and transport configuration
//! - OAuth token sets, client registrations, and cached OAuth config
//! - The orchestrator result union (`OAuthResult`)

mod result;
mod server;
mod tokens;

pub use result::*;
pub use server::*;
pub use tokens::*;
