//! Token Sources
//!
//! Shapes of the command and query objects that carry token fields back from
//! the command/query buses.

use chrono::{DateTime, Utc};

/// Object exposing a bearer token without refresh data.
pub trait TokenSource {
    fn token_type(&self) -> String;
    fn access_token(&self) -> String;
}

/// Object exposing all four fields of a [`RefreshableToken`](crate::types::RefreshableToken).
pub trait RefreshableTokenSource: TokenSource {
    fn refresh_token(&self) -> String;
    fn expires(&self) -> DateTime<Utc>;
}

/// Result of a command published on the token command bus.
pub trait TokenBasedCommand: TokenSource + Send + Sync {
    /// The refreshable view of this command, if it carries all four fields.
    fn as_refreshable(&self) -> Option<&dyn RefreshableTokenSource> {
        None
    }

    /// Concrete type name, for error reporting.
    fn source_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Result of a query sent on the token query bus.
pub trait TokenBasedQuery: TokenSource + Send + Sync {
    /// The refreshable view of this query, if it carries all four fields.
    fn as_refreshable(&self) -> Option<&dyn RefreshableTokenSource> {
        None
    }

    /// Concrete type name, for error reporting.
    fn source_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
