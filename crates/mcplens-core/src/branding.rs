//! Centralized branding constants
//!
//! All product naming comes from this module.
//!
//! # Usage
//!
//! ```rust
//! use mcplens_core::branding;
//!
//! // Access constants directly
//! println!("App: {}", branding::DISPLAY_NAME);
//!
//! // Use helper functions
//! let prefix = branding::deep_link_prefix(); // "mcplens://"
//! ```

/// User-facing product name
pub const DISPLAY_NAME: &str = "McpLens";

/// Reverse-domain application identifier
pub const IDENTIFIER: &str = "com.mcplens.app";

/// Custom URI scheme registered by the desktop shell
pub const DEEP_LINK_SCHEME: &str = "mcplens";

/// Get the deep link URL prefix (e.g., "mcplens://")
pub fn deep_link_prefix() -> String {
    format!("{}://", DEEP_LINK_SCHEME)
}

/// Check if a URL is a deep link for this app
pub fn is_deep_link(url: &str) -> bool {
    url.starts_with(&format!("{}://", DEEP_LINK_SCHEME))
}

/// The OAuth redirect landing path served by the inspector UI.
///
/// The same path doubles as the deep-link route: a provider redirect lands
/// on `https://<ui-host>/oauth/callback?...`, and the desktop handoff
/// rebuilds it as `mcplens://oauth/callback?...`.
pub fn oauth_callback_path() -> &'static str {
    "/oauth/callback"
}

/// Get the OAuth client name used for dynamic client registration
///
/// A single consistent name (not per-server) keeps registrations clean
/// when users review authorized apps on the provider side.
pub fn oauth_client_name() -> &'static str {
    DISPLAY_NAME
}

/// Build the custom-scheme callback URI for the desktop shell
///
/// # Example
/// ```
/// let uri = mcplens_core::branding::deep_link_callback_uri("code=abc&state=xyz");
/// assert_eq!(uri, "mcplens://oauth/callback?code=abc&state=xyz");
/// ```
pub fn deep_link_callback_uri(query: &str) -> String {
    if query.is_empty() {
        format!("{}://oauth/callback", DEEP_LINK_SCHEME)
    } else {
        format!("{}://oauth/callback?{}", DEEP_LINK_SCHEME, query)
    }
}

/// Check if a URL is this app's custom-scheme OAuth callback
///
/// # Example
/// ```
/// use mcplens_core::branding;
/// assert!(branding::is_deep_link_callback("mcplens://oauth/callback?code=123"));
/// assert!(!branding::is_deep_link_callback("https://example.com/oauth/callback"));
/// ```
pub fn is_deep_link_callback(url: &str) -> bool {
    url.starts_with(&format!("{}://oauth/callback", DEEP_LINK_SCHEME))
}
