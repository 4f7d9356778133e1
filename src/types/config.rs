//! Configuration Types
//!
//! Cookie and refresh policy for the token helpers, plus provider settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// `SameSite` cookie attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    /// Required for the provider callback, which is a cross-site top-level GET.
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Attributes attached to a cookie write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    pub max_age: Duration,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

/// Token helper configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenHelperConfig {
    /// Prefix of the per-authorization state cookie.
    pub state_cookie_prefix: String,
    /// Lifetime of the state cookie in seconds.
    pub state_cookie_lifetime_secs: u64,
    /// Lifetime of the token cookie in seconds.
    pub token_cookie_lifetime_secs: u64,
    /// Refresh tokens this many seconds before expiry.
    pub refresh_window_secs: u64,
    pub cookie_path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for TokenHelperConfig {
    fn default() -> Self {
        Self {
            state_cookie_prefix: ".Delegated.State".to_string(),
            state_cookie_lifetime_secs: 600,
            token_cookie_lifetime_secs: 30 * 24 * 60 * 60,
            refresh_window_secs: 300,
            cookie_path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
        }
    }
}

impl TokenHelperConfig {
    /// Refresh window as a chrono duration, saturating at `chrono::Duration::MAX`.
    pub fn refresh_window(&self) -> chrono::Duration {
        i64::try_from(self.refresh_window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Options for the short-lived state cookie.
    pub fn state_cookie_options(&self) -> CookieOptions {
        self.cookie_options(Duration::from_secs(self.state_cookie_lifetime_secs))
    }

    /// Options for the token cookie.
    pub fn token_cookie_options(&self) -> CookieOptions {
        self.cookie_options(Duration::from_secs(self.token_cookie_lifetime_secs))
    }

    fn cookie_options(&self, max_age: Duration) -> CookieOptions {
        CookieOptions {
            max_age,
            path: self.cookie_path.clone(),
            secure: self.secure,
            http_only: self.http_only,
            same_site: self.same_site,
        }
    }
}

/// Microsoft Graph provider settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicrosoftGraphConfig {
    /// Authority base, e.g. `https://login.microsoftonline.com/common/oauth2/v2.0`.
    pub authority: Url,
    pub client_id: String,
    pub scopes: Vec<String>,
    /// Path of the callback action on this application.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
    #[serde(default = "default_graph_cookie_name")]
    pub token_cookie_name: String,
}

fn default_callback_path() -> String {
    "/token/acquire".to_string()
}

fn default_graph_cookie_name() -> String {
    ".Delegated.MicrosoftGraph".to_string()
}

impl MicrosoftGraphConfig {
    /// Create settings with default callback path and cookie name.
    pub fn new(authority: Url, client_id: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            authority,
            client_id: client_id.into(),
            scopes,
            callback_path: default_callback_path(),
            token_cookie_name: default_graph_cookie_name(),
        }
    }

    /// Authorization endpoint under the authority.
    pub fn authorization_endpoint(&self) -> String {
        format!("{}/authorize", self.authority.as_str().trim_end_matches('/'))
    }

    /// Token endpoint under the authority.
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.authority.as_str().trim_end_matches('/'))
    }
}
