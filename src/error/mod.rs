//! Token Lifecycle Errors
//!
//! Error hierarchy for the delegated token subsystem.
//!
//! Untrusted request input (bad return URLs, missing state, missing cookies) is
//! never an error here: the token helpers turn it into a
//! [`TokenFlowOutcome`](crate::types::TokenFlowOutcome) instead. Everything in
//! this module is either a caller bug or a failure that must not be mistaken
//! for "no token".

use std::time::Duration;
use thiserror::Error;

/// Root error type for delegated token handling.
#[derive(Error, Debug)]
pub enum TokenLifecycleError {
    #[error("Argument error: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(#[from] UnsupportedSourceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Protection error: {0}")]
    Protection(#[from] ProtectionError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl TokenLifecycleError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Argument(_) => "TOKEN_ARGUMENT",
            Self::Configuration(_) => "TOKEN_CONFIG",
            Self::UnsupportedSource(_) => "TOKEN_UNSUPPORTED_SOURCE",
            Self::Serialization(_) => "TOKEN_SERIALIZATION",
            Self::Protection(_) => "TOKEN_PROTECTION",
            Self::Provider(_) => "TOKEN_PROVIDER",
            Self::Network(_) => "TOKEN_NETWORK",
            Self::Protocol(_) => "TOKEN_PROTOCOL",
        }
    }

    /// Check if the failing operation may succeed when repeated unchanged.
    ///
    /// Nothing in this crate retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Provider(ProviderError::ServerError { .. }) => true,
            Self::Provider(ProviderError::TemporarilyUnavailable { .. }) => true,
            _ => false,
        }
    }

    /// Get retry-after duration if applicable.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Provider(ProviderError::TemporarilyUnavailable { retry_after }) => *retry_after,
            _ => None,
        }
    }

    /// Check if the caller should send the user through authorization again.
    ///
    /// Corrupt cookies and rejected refresh grants both end here: the stored
    /// token cannot be trusted or used any more.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            Self::Serialization(_)
                | Self::Protection(ProtectionError::DecryptionFailed { .. })
                | Self::Provider(ProviderError::InvalidGrant { .. })
                | Self::Provider(ProviderError::AccessDenied { .. })
        )
    }
}

/// Null, empty or whitespace input to a public operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Value cannot be empty or whitespace (parameter '{parameter}')")]
    EmptyOrWhitespace { parameter: &'static str },

    #[error("Value cannot be null (parameter '{parameter}')")]
    Missing { parameter: &'static str },
}

impl ArgumentError {
    /// Name of the offending parameter.
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::EmptyOrWhitespace { parameter } | Self::Missing { parameter } => parameter,
        }
    }
}

/// Reject empty or whitespace-only strings.
pub(crate) fn ensure_not_blank(
    value: &str,
    parameter: &'static str,
) -> Result<(), ArgumentError> {
    if value.trim().is_empty() {
        return Err(ArgumentError::EmptyOrWhitespace { parameter });
    }
    Ok(())
}

/// Programming mistakes in how the crate is wired or called.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{setter} must be called before Build on {builder}")]
    MissingBuilderField {
        setter: &'static str,
        builder: &'static str,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("No token helper registered for token kind {kind}")]
    HelperNotRegistered { kind: String },

    #[error("Invalid protection key: {message}")]
    InvalidKey { message: String },
}

/// A token was requested from an object that does not carry all four fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Source must implement {required}; {source_type} does not")]
pub struct UnsupportedSourceError {
    /// Interface the source was expected to expose.
    pub required: &'static str,
    /// Concrete type of the rejected source.
    pub source_type: &'static str,
}

/// Malformed serialized token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Token data truncated: needed {needed} more bytes")]
    Truncated { needed: usize },

    #[error("Unsupported token format version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Token field '{field}' is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("Token field '{field}' is invalid: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("{count} unexpected trailing bytes after token data")]
    TrailingBytes { count: usize },

    #[error("Invalid base64: {message}")]
    InvalidBase64 { message: String },
}

/// Encryption at rest failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtectionError {
    #[error("Encryption failed for purpose '{purpose}'")]
    EncryptionFailed { purpose: String },

    #[error("Decryption failed for purpose '{purpose}'")]
    DecryptionFailed { purpose: String },

    #[error("Protected payload for purpose '{purpose}' is malformed: {message}")]
    MalformedPayload { purpose: String, message: String },
}

/// Provider (OAuth2 server) error.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Access denied: {error}")]
    AccessDenied {
        error: String,
        error_description: Option<String>,
    },

    #[error("Invalid client credentials")]
    InvalidClient { error_description: Option<String> },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Unauthorized client for this grant type")]
    UnauthorizedClient { error_description: Option<String> },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Server temporarily unavailable")]
    TemporarilyUnavailable { retry_after: Option<Duration> },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS error: {message}")]
    TlsError { message: String },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TlsError { .. })
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Result type for token lifecycle operations.
pub type TokenResult<T> = Result<T, TokenLifecycleError>;

/// OAuth2 error response from provider.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Map token endpoint error response to error type.
pub fn map_token_error(response: &OAuth2ErrorResponse) -> ProviderError {
    let description = || response.error_description.clone();
    match response.error.as_str() {
        "access_denied" => ProviderError::AccessDenied {
            error: response.error.clone(),
            error_description: description(),
        },
        "invalid_client" => ProviderError::InvalidClient {
            error_description: description(),
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            message: description().unwrap_or_else(|| "Invalid grant".to_string()),
        },
        "invalid_scope" => ProviderError::InvalidScope {
            scope: description().unwrap_or_default(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            error_description: description(),
        },
        "server_error" => ProviderError::ServerError {
            message: description().unwrap_or_else(|| "Server error".to_string()),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable { retry_after: None },
        _ => ProviderError::InvalidRequest {
            message: description().unwrap_or_else(|| response.error.clone()),
        },
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create error from a non-success token endpoint response.
pub fn create_error_from_response(status: u16, body: &str) -> TokenLifecycleError {
    if let Some(response) = parse_error_response(body) {
        return TokenLifecycleError::Provider(map_token_error(&response));
    }

    let error = match status {
        400 => ProviderError::InvalidRequest {
            message: "Bad request".to_string(),
        },
        401 => ProviderError::InvalidClient {
            error_description: Some("Unauthorized".to_string()),
        },
        403 => ProviderError::UnauthorizedClient {
            error_description: Some("Forbidden".to_string()),
        },
        429 => ProviderError::TemporarilyUnavailable {
            retry_after: Some(Duration::from_secs(60)),
        },
        _ => ProviderError::ServerError {
            message: format!("HTTP {}", status),
        },
    };

    TokenLifecycleError::Provider(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_names_parameter() {
        let err = ensure_not_blank("   ", "return_url").unwrap_err();
        assert_eq!(err.parameter(), "return_url");
        assert!(err.to_string().contains("return_url"));
        assert!(ensure_not_blank("x", "return_url").is_ok());
    }

    #[test]
    fn test_missing_builder_field_message() {
        let err = ConfigurationError::MissingBuilderField {
            setter: "with_token_type",
            builder: "delegated_token::builders::token::TokenBuilder",
        };
        let message = err.to_string();
        assert!(message.contains("with_token_type"));
        assert!(message.contains("TokenBuilder"));
    }

    #[test]
    fn test_needs_reauth() {
        assert!(TokenLifecycleError::Serialization(SerializationError::Truncated { needed: 4 })
            .needs_reauth());
        assert!(TokenLifecycleError::Protection(ProtectionError::DecryptionFailed {
            purpose: "TokenProtection".to_string()
        })
        .needs_reauth());
        assert!(!TokenLifecycleError::Argument(ArgumentError::Missing { parameter: "x" })
            .needs_reauth());
    }

    #[test]
    fn test_create_error_from_response() {
        let body = r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#;
        let err = create_error_from_response(400, body);
        assert!(matches!(
            err,
            TokenLifecycleError::Provider(ProviderError::InvalidGrant { ref message })
                if message == "Refresh token revoked"
        ));
        assert!(err.needs_reauth());

        let err = create_error_from_response(503, "unavailable");
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "TOKEN_PROVIDER");
    }
}
