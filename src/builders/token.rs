//! Token Builder
//!
//! Fluent builder for [`RefreshableToken`].

use chrono::{DateTime, Utc};

use crate::error::{ensure_not_blank, ArgumentError, ConfigurationError};
use crate::types::RefreshableToken;

/// Accumulates the four token fields; [`build`](Self::build) fails until all are set.
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
    token_type: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires: Option<DateTime<Utc>>,
}

impl TokenBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set token type.
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Result<Self, ArgumentError> {
        let token_type = token_type.into();
        ensure_not_blank(&token_type, "token_type")?;
        self.token_type = Some(token_type);
        Ok(self)
    }

    /// Set access token.
    pub fn with_access_token(
        mut self,
        access_token: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        let access_token = access_token.into();
        ensure_not_blank(&access_token, "access_token")?;
        self.access_token = Some(access_token);
        Ok(self)
    }

    /// Set refresh token.
    pub fn with_refresh_token(
        mut self,
        refresh_token: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        let refresh_token = refresh_token.into();
        ensure_not_blank(&refresh_token, "refresh_token")?;
        self.refresh_token = Some(refresh_token);
        Ok(self)
    }

    /// Set expiry instant.
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Build the token.
    ///
    /// A missing field is reported as a [`ConfigurationError`] naming the setter
    /// that was never called; fields are checked in declaration order.
    pub fn build(&self) -> Result<RefreshableToken, ConfigurationError> {
        let token_type = self.token_type.as_ref().ok_or_else(|| missing("with_token_type"))?;
        let access_token = self
            .access_token
            .as_ref()
            .ok_or_else(|| missing("with_access_token"))?;
        let refresh_token = self
            .refresh_token
            .as_ref()
            .ok_or_else(|| missing("with_refresh_token"))?;
        let expires = self.expires.ok_or_else(|| missing("with_expires"))?;

        // Setters already rejected blank values.
        RefreshableToken::new(
            token_type.clone(),
            access_token.clone(),
            refresh_token.clone(),
            expires,
        )
        .map_err(|e| ConfigurationError::InvalidConfig {
            message: e.to_string(),
        })
    }
}

fn missing(setter: &'static str) -> ConfigurationError {
    ConfigurationError::MissingBuilderField {
        setter,
        builder: std::any::type_name::<TokenBuilder>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn expires() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2029, 12, 31, 23, 59, 59).unwrap()
    }

    fn assert_missing(result: Result<RefreshableToken, ConfigurationError>, setter: &str) {
        let message = result.unwrap_err().to_string();
        assert!(message.contains(setter), "{}", message);
        assert!(message.contains("TokenBuilder"), "{}", message);
    }

    #[test]
    fn test_build_with_all_fields() {
        let token = TokenBuilder::new()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("access")
            .unwrap()
            .with_refresh_token("refresh")
            .unwrap()
            .with_expires(expires())
            .build()
            .unwrap();

        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.access_token(), "access");
        assert_eq!(token.refresh_token(), "refresh");
        assert_eq!(token.expires(), expires());
    }

    #[test]
    fn test_order_does_not_matter_and_last_value_wins() {
        let later = expires() + Duration::hours(1);
        let token = TokenBuilder::new()
            .with_expires(expires())
            .with_refresh_token("r1")
            .unwrap()
            .with_access_token("a1")
            .unwrap()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("a2")
            .unwrap()
            .with_expires(later)
            .build()
            .unwrap();

        assert_eq!(token.access_token(), "a2");
        assert_eq!(token.refresh_token(), "r1");
        assert_eq!(token.expires(), later);
    }

    #[test]
    fn test_each_missing_field_is_reported() {
        let full = TokenBuilder::new()
            .with_token_type("Bearer")
            .unwrap()
            .with_access_token("a")
            .unwrap()
            .with_refresh_token("r")
            .unwrap()
            .with_expires(expires());

        let mut without = full.clone();
        without.token_type = None;
        assert_missing(without.build(), "with_token_type");

        let mut without = full.clone();
        without.access_token = None;
        assert_missing(without.build(), "with_access_token");

        let mut without = full.clone();
        without.refresh_token = None;
        assert_missing(without.build(), "with_refresh_token");

        let mut without = full;
        without.expires = None;
        assert_missing(without.build(), "with_expires");
    }

    #[test]
    fn test_first_missing_field_wins() {
        let builder = TokenBuilder::new().with_refresh_token("r").unwrap();
        assert_missing(builder.build(), "with_token_type");
        // Repeated calls keep failing the same way.
        assert_missing(builder.build(), "with_token_type");

        let builder = TokenBuilder::new().with_token_type("Bearer").unwrap();
        assert_missing(builder.build(), "with_access_token");
    }

    #[test]
    fn test_setters_reject_blank_values() {
        assert_eq!(
            TokenBuilder::new().with_token_type(" ").unwrap_err().parameter(),
            "token_type"
        );
        assert_eq!(
            TokenBuilder::new().with_access_token("").unwrap_err().parameter(),
            "access_token"
        );
        assert_eq!(
            TokenBuilder::new().with_refresh_token("\t").unwrap_err().parameter(),
            "refresh_token"
        );
    }
}
