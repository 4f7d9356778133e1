//! Flow Outcomes
//!
//! What a token helper operation asks the HTTP layer to do.

use std::fmt;
use url::Url;

/// Why a request was rejected as a client error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadRequestReason {
    /// `return_url` is not an absolute URI.
    InvalidReturnUrl,
    /// `return_url` host is not on the allow-list.
    UntrustedReturnUrl,
    /// The request method is not `GET`.
    MethodNotAllowed,
    /// The callback carried no usable state identifier.
    MissingStateIdentifier,
    /// No state cookie matches the callback's state identifier.
    MissingStateCookie,
    /// Refresh was requested but no token cookie exists.
    MissingTokenCookie,
}

impl fmt::Display for BadRequestReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InvalidReturnUrl => "return url is not absolute",
            Self::UntrustedReturnUrl => "return url is not trusted",
            Self::MethodNotAllowed => "request method must be GET",
            Self::MissingStateIdentifier => "missing state identifier",
            Self::MissingStateCookie => "no state cookie for state identifier",
            Self::MissingTokenCookie => "no token cookie",
        };
        f.write_str(text)
    }
}

/// Result of a token helper phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenFlowOutcome {
    /// Redirect the user agent.
    Redirect(Url),
    /// Reject the request as a client error.
    BadRequest { reason: BadRequestReason },
    /// The provider refused the authorization.
    Unauthorized { reason: String },
}

impl TokenFlowOutcome {
    pub(crate) fn bad_request(reason: BadRequestReason) -> Self {
        Self::BadRequest { reason }
    }

    /// HTTP status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Redirect(_) => 302,
            Self::BadRequest { .. } => 400,
            Self::Unauthorized { .. } => 401,
        }
    }

    /// Redirect target, if any.
    pub fn redirect_location(&self) -> Option<&Url> {
        match self {
            Self::Redirect(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let redirect = TokenFlowOutcome::Redirect(Url::parse("https://example.com/").unwrap());
        assert_eq!(redirect.status_code(), 302);
        assert!(redirect.redirect_location().is_some());

        let bad = TokenFlowOutcome::bad_request(BadRequestReason::MissingStateCookie);
        assert_eq!(bad.status_code(), 400);
        assert!(bad.is_bad_request());

        let denied = TokenFlowOutcome::Unauthorized {
            reason: "access_denied".to_string(),
        };
        assert_eq!(denied.status_code(), 401);
        assert!(denied.redirect_location().is_none());
    }
}
