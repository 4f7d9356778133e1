//! Configuration Builder
//!
//! Fluent builder for token helper configuration.

use std::time::Duration;

use crate::error::{ConfigurationError, TokenLifecycleError};
use crate::types::{SameSite, TokenHelperConfig};

/// Token helper configuration builder.
#[derive(Default)]
pub struct TokenHelperConfigBuilder {
    config: TokenHelperConfig,
}

impl TokenHelperConfigBuilder {
    /// Create new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set state cookie prefix.
    pub fn state_cookie_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.state_cookie_prefix = prefix.into();
        self
    }

    /// Set state cookie lifetime.
    pub fn state_cookie_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.state_cookie_lifetime_secs = lifetime.as_secs();
        self
    }

    /// Set token cookie lifetime.
    pub fn token_cookie_lifetime(mut self, lifetime: Duration) -> Self {
        self.config.token_cookie_lifetime_secs = lifetime.as_secs();
        self
    }

    /// Set how long before expiry a token counts as needing refresh.
    pub fn refresh_window(mut self, window: Duration) -> Self {
        self.config.refresh_window_secs = window.as_secs();
        self
    }

    /// Set cookie path.
    pub fn cookie_path(mut self, path: impl Into<String>) -> Self {
        self.config.cookie_path = path.into();
        self
    }

    /// Mark cookies `Secure`.
    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;
        self
    }

    /// Mark cookies `HttpOnly`.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.config.http_only = http_only;
        self
    }

    /// Set `SameSite` attribute.
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.config.same_site = same_site;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<TokenHelperConfig, TokenLifecycleError> {
        validate(&self.config)?;
        Ok(self.config)
    }
}

/// Validate a configuration, e.g. one loaded with serde.
pub fn validate(config: &TokenHelperConfig) -> Result<(), ConfigurationError> {
    let invalid = |message: &str| ConfigurationError::InvalidConfig {
        message: message.to_string(),
    };

    if config.state_cookie_prefix.trim().is_empty() {
        return Err(invalid("state_cookie_prefix must not be empty"));
    }
    if !config.cookie_path.starts_with('/') {
        return Err(invalid("cookie_path must start with '/'"));
    }
    if config.state_cookie_lifetime_secs == 0 || config.token_cookie_lifetime_secs == 0 {
        return Err(invalid("cookie lifetimes must be greater than zero"));
    }
    if i64::try_from(config.refresh_window_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .is_none()
    {
        return Err(invalid("refresh_window is out of range"));
    }
    if config.same_site == SameSite::None && !config.secure {
        return Err(invalid("SameSite=None requires secure cookies"));
    }
    Ok(())
}

/// Create a new token helper configuration builder.
pub fn token_helper_config() -> TokenHelperConfigBuilder {
    TokenHelperConfigBuilder::new()
}
