//! OAuth integration tests
//!
//! Covers the reconnect orchestrator, silent refresh, flow initiation,
//! callback dispatch, and the wire-level discovery/registration/token
//! clients against a mock authorization server.

mod dcr;
