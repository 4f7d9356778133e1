//! Token Types
//!
//! The refreshable bearer token carried between the provider and the cookie jar.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::error::{ensure_not_blank, ArgumentError, TokenResult};
use crate::token::codec;

/// Kind of delegated token; each kind is tracked with its own cookies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TokenKind {
    /// Microsoft Graph delegated access.
    MicrosoftGraph,
}

impl TokenKind {
    /// Stable name used in cookie names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MicrosoftGraph => "MicrosoftGraph",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable bearer token bundle.
///
/// All four fields are always present: there is no partially populated token.
/// Build one with [`RefreshableToken::new`], the
/// [`TokenBuilder`](crate::builders::TokenBuilder), or the
/// [`TokenCreator`](crate::token::TokenCreator).
#[derive(Clone)]
pub struct RefreshableToken {
    token_type: String,
    access_token: SecretString,
    refresh_token: SecretString,
    expires: DateTime<Utc>,
}

impl RefreshableToken {
    /// Create a token, rejecting empty or whitespace strings.
    pub fn new(
        token_type: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires: DateTime<Utc>,
    ) -> Result<Self, ArgumentError> {
        let token_type = token_type.into();
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();

        ensure_not_blank(&token_type, "token_type")?;
        ensure_not_blank(&access_token, "access_token")?;
        ensure_not_blank(&refresh_token, "refresh_token")?;

        Ok(Self {
            token_type,
            access_token: SecretString::new(access_token),
            refresh_token: SecretString::new(refresh_token),
            expires,
        })
    }

    /// Token type (usually "Bearer").
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Access token value.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Refresh token value.
    pub fn refresh_token(&self) -> &str {
        self.refresh_token.expose_secret()
    }

    /// Absolute expiry instant.
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// True iff the token expires at or before `now + window`.
    ///
    /// A window reaching past the representable range covers every expiry.
    pub fn will_expire_within(&self, window: Duration) -> bool {
        self.will_expire_within_at(window, Utc::now())
    }

    /// [`will_expire_within`](Self::will_expire_within) against an explicit clock.
    pub fn will_expire_within_at(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now.checked_add_signed(window)
            .map_or(true, |limit| self.expires <= limit)
    }

    /// Check if token is already expired.
    pub fn is_expired(&self) -> bool {
        self.will_expire_within(Duration::zero())
    }

    /// Format as Authorization header value.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.expose_secret())
    }

    /// Serialize into the stable binary format.
    pub fn to_byte_array(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Serialize into standard base64 of [`to_byte_array`](Self::to_byte_array).
    pub fn to_base64_string(&self) -> String {
        codec::encode_base64(self)
    }

    /// Decode bytes produced by [`to_byte_array`](Self::to_byte_array).
    pub fn from_byte_array(bytes: &[u8]) -> TokenResult<Self> {
        crate::token::TokenCreator::from_byte_array(bytes)
    }

    /// Decode a string produced by [`to_base64_string`](Self::to_base64_string).
    pub fn from_base64_string(value: &str) -> TokenResult<Self> {
        crate::token::TokenCreator::from_base64_string(value)
    }
}

impl PartialEq for RefreshableToken {
    fn eq(&self, other: &Self) -> bool {
        self.token_type == other.token_type
            && self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.refresh_token.expose_secret() == other.refresh_token.expose_secret()
            && self.expires == other.expires
    }
}

impl Eq for RefreshableToken {}

impl fmt::Debug for RefreshableToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshableToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expires() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap() + Duration::nanoseconds(123_456_789)
    }

    #[test]
    fn test_new_keeps_values() {
        let token = RefreshableToken::new("Bearer", "access", "refresh", expires()).unwrap();
        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.access_token(), "access");
        assert_eq!(token.refresh_token(), "refresh");
        assert_eq!(token.expires(), expires());
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        let cases = [
            (("", "a", "r"), "token_type"),
            (("  ", "a", "r"), "token_type"),
            (("Bearer", "", "r"), "access_token"),
            (("Bearer", "\t", "r"), "access_token"),
            (("Bearer", "a", ""), "refresh_token"),
            (("Bearer", "a", " \n"), "refresh_token"),
        ];

        for ((token_type, access, refresh), parameter) in cases {
            let err = RefreshableToken::new(token_type, access, refresh, expires()).unwrap_err();
            assert_eq!(err.parameter(), parameter);
        }
    }

    #[test]
    fn test_will_expire_within() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let token =
            RefreshableToken::new("Bearer", "a", "r", now + Duration::minutes(5)).unwrap();

        assert!(token.will_expire_within_at(Duration::minutes(10), now));
        assert!(token.will_expire_within_at(Duration::minutes(5), now));
        assert!(!token.will_expire_within_at(Duration::minutes(4), now));
    }

    #[test]
    fn test_will_expire_within_overflowing_window() {
        let token = RefreshableToken::new("Bearer", "a", "r", Utc::now()).unwrap();

        assert!(token.will_expire_within(Duration::days(365 * 300_000)));
        assert!(token.will_expire_within(Duration::MAX));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = RefreshableToken::new("Bearer", "secret-a", "secret-r", expires()).unwrap();
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret-a"));
        assert!(!debug.contains("secret-r"));
        assert_eq!(token.authorization_header(), "Bearer secret-a");
    }
}
