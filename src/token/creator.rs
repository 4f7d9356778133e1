//! Token Creator
//!
//! Rebuilds [`RefreshableToken`]s from serialized bytes and from bus results.

use crate::builders::TokenBuilder;
use crate::error::{ensure_not_blank, ArgumentError, TokenResult, UnsupportedSourceError};
use crate::token::codec;
use crate::types::{RefreshableToken, RefreshableTokenSource, TokenBasedCommand, TokenBasedQuery};

const REFRESHABLE_SOURCE: &str = "RefreshableTokenSource";

/// Factory over every supported token source.
pub struct TokenCreator;

impl TokenCreator {
    /// Decode bytes produced by [`RefreshableToken::to_byte_array`].
    pub fn from_byte_array(byte_array: &[u8]) -> TokenResult<RefreshableToken> {
        if byte_array.is_empty() {
            return Err(ArgumentError::Missing {
                parameter: "byte_array",
            }
            .into());
        }
        Ok(codec::decode(byte_array)?)
    }

    /// Decode a string produced by [`RefreshableToken::to_base64_string`].
    pub fn from_base64_string(base64_string: &str) -> TokenResult<RefreshableToken> {
        ensure_not_blank(base64_string, "base64_string")?;
        Ok(codec::decode_base64(base64_string)?)
    }

    /// Copy the token fields off a command result.
    pub fn from_token_based_command(
        refreshable_token_based_command: Option<&dyn TokenBasedCommand>,
    ) -> TokenResult<RefreshableToken> {
        let command = refreshable_token_based_command.ok_or(ArgumentError::Missing {
            parameter: "refreshable_token_based_command",
        })?;

        let source = command.as_refreshable().ok_or(UnsupportedSourceError {
            required: REFRESHABLE_SOURCE,
            source_type: command.source_type_name(),
        })?;
        Self::from_refreshable_source(source)
    }

    /// Copy the token fields off a query result.
    pub fn from_token_based_query(
        refreshable_token_based_query: Option<&dyn TokenBasedQuery>,
    ) -> TokenResult<RefreshableToken> {
        let query = refreshable_token_based_query.ok_or(ArgumentError::Missing {
            parameter: "refreshable_token_based_query",
        })?;

        let source = query.as_refreshable().ok_or(UnsupportedSourceError {
            required: REFRESHABLE_SOURCE,
            source_type: query.source_type_name(),
        })?;
        Self::from_refreshable_source(source)
    }

    // Each accessor is read exactly once, in field order.
    fn from_refreshable_source(source: &dyn RefreshableTokenSource) -> TokenResult<RefreshableToken> {
        let token = TokenBuilder::new()
            .with_token_type(source.token_type())?
            .with_access_token(source.access_token())?
            .with_refresh_token(source.refresh_token())?
            .with_expires(source.expires())
            .build()?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenLifecycleError;
    use crate::types::TokenSource;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn expires() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 6, 7, 8, 9).unwrap() + Duration::nanoseconds(42)
    }

    /// Refreshable source counting every property read.
    #[derive(Default)]
    struct CountingSource {
        reads: [AtomicUsize; 4],
        order: std::sync::Mutex<Vec<&'static str>>,
    }

    impl CountingSource {
        fn read(&self, index: usize, name: &'static str) {
            self.reads[index].fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push(name);
        }

        fn counts(&self) -> Vec<usize> {
            self.reads.iter().map(|c| c.load(Ordering::SeqCst)).collect()
        }
    }

    impl TokenSource for CountingSource {
        fn token_type(&self) -> String {
            self.read(0, "token_type");
            "Bearer".to_string()
        }

        fn access_token(&self) -> String {
            self.read(1, "access_token");
            "access".to_string()
        }
    }

    impl RefreshableTokenSource for CountingSource {
        fn refresh_token(&self) -> String {
            self.read(2, "refresh_token");
            "refresh".to_string()
        }

        fn expires(&self) -> DateTime<Utc> {
            self.read(3, "expires");
            expires()
        }
    }

    impl TokenBasedCommand for CountingSource {
        fn as_refreshable(&self) -> Option<&dyn RefreshableTokenSource> {
            Some(self)
        }
    }

    impl TokenBasedQuery for CountingSource {
        fn as_refreshable(&self) -> Option<&dyn RefreshableTokenSource> {
            Some(self)
        }
    }

    /// Token-based source without refresh data.
    struct AccessOnlySource;

    impl TokenSource for AccessOnlySource {
        fn token_type(&self) -> String {
            "Bearer".to_string()
        }

        fn access_token(&self) -> String {
            "access".to_string()
        }
    }

    impl TokenBasedCommand for AccessOnlySource {}
    impl TokenBasedQuery for AccessOnlySource {}

    #[test]
    fn test_from_command_reads_each_field_once() {
        let source = CountingSource::default();
        let token = TokenCreator::from_token_based_command(Some(&source)).unwrap();

        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.access_token(), "access");
        assert_eq!(token.refresh_token(), "refresh");
        assert_eq!(token.expires(), expires());
        assert_eq!(source.counts(), vec![1, 1, 1, 1]);
        assert_eq!(
            *source.order.lock().unwrap(),
            vec!["token_type", "access_token", "refresh_token", "expires"]
        );
    }

    #[test]
    fn test_from_query_reads_each_field_once() {
        let source = CountingSource::default();
        let token = TokenCreator::from_token_based_query(Some(&source)).unwrap();

        assert_eq!(token.refresh_token(), "refresh");
        assert_eq!(source.counts(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_missing_source_names_parameter() {
        let err = TokenCreator::from_token_based_command(None).unwrap_err();
        assert!(matches!(
            err,
            TokenLifecycleError::Argument(ArgumentError::Missing {
                parameter: "refreshable_token_based_command"
            })
        ));

        let err = TokenCreator::from_token_based_query(None).unwrap_err();
        assert!(matches!(
            err,
            TokenLifecycleError::Argument(ArgumentError::Missing {
                parameter: "refreshable_token_based_query"
            })
        ));
    }

    #[test]
    fn test_access_only_source_is_unsupported() {
        let err = TokenCreator::from_token_based_command(Some(&AccessOnlySource)).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, TokenLifecycleError::UnsupportedSource(_)));
        assert!(message.contains("RefreshableTokenSource"));
        assert!(message.contains("AccessOnlySource"));

        let err = TokenCreator::from_token_based_query(Some(&AccessOnlySource)).unwrap_err();
        assert!(err.to_string().contains("AccessOnlySource"));
    }

    #[test]
    fn test_byte_array_round_trip() {
        let token = RefreshableToken::new("Bearer", "a", "r", expires()).unwrap();
        assert_eq!(TokenCreator::from_byte_array(&token.to_byte_array()).unwrap(), token);
        assert_eq!(
            TokenCreator::from_base64_string(&token.to_base64_string()).unwrap(),
            token
        );
    }

    #[test]
    fn test_empty_inputs_name_parameter() {
        let err = TokenCreator::from_byte_array(&[]).unwrap_err();
        assert!(matches!(
            err,
            TokenLifecycleError::Argument(ArgumentError::Missing { parameter: "byte_array" })
        ));

        let err = TokenCreator::from_base64_string(" ").unwrap_err();
        assert!(matches!(
            err,
            TokenLifecycleError::Argument(ArgumentError::EmptyOrWhitespace {
                parameter: "base64_string"
            })
        ));
    }

    #[test]
    fn test_corrupt_bytes_are_a_serialization_failure() {
        let err = TokenCreator::from_byte_array(&[1, 0, 0]).unwrap_err();
        assert!(matches!(err, TokenLifecycleError::Serialization(_)));
        assert!(err.needs_reauth());
    }
}
