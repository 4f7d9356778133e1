//! Token Buses
//!
//! The command and query seams that turn authorization codes, refresh tokens
//! and raw provider payloads into token-bearing results.

mod http;

pub use http::HttpTokenBus;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{NetworkError, ProtocolError, TokenResult};
use crate::types::{RefreshableTokenSource, TokenBasedCommand, TokenBasedQuery, TokenSource};

/// Command published to obtain a token.
#[derive(Clone, Debug)]
pub enum TokenCommand {
    /// Exchange an authorization code.
    AcquireToken {
        authorization_code: SecretString,
        redirect_uri: String,
        scopes: Vec<String>,
    },
    /// Exchange a refresh token.
    RefreshToken {
        refresh_token: SecretString,
        scopes: Vec<String>,
    },
}

impl TokenCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcquireToken { .. } => "acquire_token",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

/// Query sent to interpret an externally obtained token.
#[derive(Clone, Debug)]
pub enum TokenQuery {
    /// Interpret a raw provider token response.
    FromPayload { payload: String },
}

/// Command bus seam.
#[async_trait]
pub trait TokenCommandBus: Send + Sync {
    async fn publish(&self, command: TokenCommand) -> TokenResult<Box<dyn TokenBasedCommand>>;
}

/// Query bus seam.
#[async_trait]
pub trait TokenQueryBus: Send + Sync {
    /// `None` when the query yields no token.
    async fn query(&self, query: TokenQuery) -> TokenResult<Option<Box<dyn TokenBasedQuery>>>;
}

/// Token response from the provider token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn expiry_after(received_at: DateTime<Utc>, expires_in: u64) -> TokenResult<DateTime<Utc>> {
    i64::try_from(expires_in)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| received_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            ProtocolError::InvalidResponse {
                message: format!("expires_in {} is out of range", expires_in),
            }
            .into()
        })
}

/// Token issued through a bus.
///
/// Refreshable only when the provider returned both a refresh token and a
/// lifetime.
#[derive(Clone)]
pub struct IssuedToken {
    pub token_type: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires: Option<DateTime<Utc>>,
}

impl IssuedToken {
    /// Create from token response received at `received_at`.
    ///
    /// Fails when `expires_in` does not fit in a representable timestamp.
    pub fn from_response(
        response: TokenResponse,
        received_at: DateTime<Utc>,
    ) -> TokenResult<Self> {
        let expires = match response.expires_in {
            Some(secs) => Some(expiry_after(received_at, secs)?),
            None => None,
        };

        Ok(Self {
            token_type: response.token_type,
            access_token: SecretString::new(response.access_token),
            refresh_token: response.refresh_token.map(SecretString::new),
            expires,
        })
    }

    fn is_refreshable(&self) -> bool {
        self.refresh_token.is_some() && self.expires.is_some()
    }
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires", &self.expires)
            .finish()
    }
}

impl TokenSource for IssuedToken {
    fn token_type(&self) -> String {
        self.token_type.clone()
    }

    fn access_token(&self) -> String {
        self.access_token.expose_secret().clone()
    }
}

impl RefreshableTokenSource for IssuedToken {
    fn refresh_token(&self) -> String {
        self.refresh_token
            .as_ref()
            .map(|t| t.expose_secret().clone())
            .unwrap_or_default()
    }

    fn expires(&self) -> DateTime<Utc> {
        self.expires.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl TokenBasedCommand for IssuedToken {
    fn as_refreshable(&self) -> Option<&dyn RefreshableTokenSource> {
        if self.is_refreshable() {
            Some(self)
        } else {
            None
        }
    }
}

impl TokenBasedQuery for IssuedToken {
    fn as_refreshable(&self) -> Option<&dyn RefreshableTokenSource> {
        if self.is_refreshable() {
            Some(self)
        } else {
            None
        }
    }
}

/// Mock bus for testing.
///
/// Queued results are returned in order; an empty queue is a network failure.
#[derive(Default)]
pub struct MockTokenBus {
    command_results: Mutex<Vec<TokenResult<IssuedToken>>>,
    query_results: Mutex<Vec<Option<IssuedToken>>>,
    command_history: Mutex<Vec<TokenCommand>>,
    query_history: Mutex<Vec<TokenQuery>>,
}

impl MockTokenBus {
    /// Create new mock bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next published command.
    pub fn queue_command_result(&self, result: TokenResult<IssuedToken>) -> &Self {
        self.command_results.lock().unwrap().push(result);
        self
    }

    /// Queue the result of the next query.
    pub fn queue_query_result(&self, result: Option<IssuedToken>) -> &Self {
        self.query_results.lock().unwrap().push(result);
        self
    }

    /// Commands published so far.
    pub fn get_command_history(&self) -> Vec<TokenCommand> {
        self.command_history.lock().unwrap().clone()
    }

    /// Queries sent so far.
    pub fn get_query_history(&self) -> Vec<TokenQuery> {
        self.query_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenCommandBus for MockTokenBus {
    async fn publish(&self, command: TokenCommand) -> TokenResult<Box<dyn TokenBasedCommand>> {
        self.command_history.lock().unwrap().push(command);

        let mut results = self.command_results.lock().unwrap();
        if results.is_empty() {
            return Err(NetworkError::ConnectionFailed {
                message: "No mock command result available".to_string(),
            }
            .into());
        }
        let issued = results.remove(0)?;
        Ok(Box::new(issued))
    }
}

#[async_trait]
impl TokenQueryBus for MockTokenBus {
    async fn query(&self, query: TokenQuery) -> TokenResult<Option<Box<dyn TokenBasedQuery>>> {
        self.query_history.lock().unwrap().push(query);

        let mut results = self.query_results.lock().unwrap();
        let issued = if results.is_empty() {
            None
        } else {
            results.remove(0)
        };
        Ok(issued.map(|t| Box::new(t) as Box<dyn TokenBasedQuery>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenCreator;
    use chrono::TimeZone;

    fn response(json: &str) -> TokenResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_issued_token_from_full_response() {
        let received = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let issued = IssuedToken::from_response(
            response(
                r#"{"access_token":"a","token_type":"Bearer","expires_in":3600,"refresh_token":"r"}"#,
            ),
            received,
        )
        .unwrap();

        let token = TokenCreator::from_token_based_command(Some(&issued)).unwrap();
        assert_eq!(token.access_token(), "a");
        assert_eq!(token.refresh_token(), "r");
        assert_eq!(token.expires(), received + Duration::hours(1));
    }

    #[test]
    fn test_issued_token_without_refresh_is_not_refreshable() {
        let issued = IssuedToken::from_response(
            response(r#"{"access_token":"a","expires_in":3600}"#),
            Utc::now(),
        )
        .unwrap();

        assert!(TokenBasedCommand::as_refreshable(&issued).is_none());
        let err = TokenCreator::from_token_based_query(Some(&issued)).unwrap_err();
        assert!(err.to_string().contains("IssuedToken"));
    }

    #[test]
    fn test_debug_redacts() {
        let issued = IssuedToken::from_response(
            response(r#"{"access_token":"secret-a","refresh_token":"secret-r"}"#),
            Utc::now(),
        )
        .unwrap();
        let debug = format!("{:?}", issued);
        assert!(!debug.contains("secret-a"));
        assert!(!debug.contains("secret-r"));
    }

    #[test]
    fn test_out_of_range_lifetime_is_rejected() {
        for expires_in in [100_000_000_000_000_000u64, u64::MAX] {
            let result = IssuedToken::from_response(
                response(&format!(
                    r#"{{"access_token":"a","refresh_token":"r","expires_in":{}}}"#,
                    expires_in
                )),
                Utc::now(),
            );
            assert!(matches!(
                result,
                Err(crate::error::TokenLifecycleError::Protocol(
                    ProtocolError::InvalidResponse { .. }
                ))
            ));
        }
    }

    #[tokio::test]
    async fn test_mock_bus_returns_in_order() {
        let bus = MockTokenBus::new();
        bus.queue_query_result(None);

        assert!(bus
            .query(TokenQuery::FromPayload {
                payload: "{}".to_string()
            })
            .await
            .unwrap()
            .is_none());
        assert!(bus
            .publish(TokenCommand::RefreshToken {
                refresh_token: SecretString::new("r".to_string()),
                scopes: Vec::new(),
            })
            .await
            .is_err());
        assert_eq!(bus.get_command_history().len(), 1);
        assert_eq!(bus.get_query_history().len(), 1);
    }
}
