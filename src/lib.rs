//! Delegated Token Lifecycle
//!
//! Acquire, store, refresh and clear delegated OAuth2 tokens for a web
//! application, keeping both the in-flight authorization state and the token
//! itself in encrypted cookies.
//!
//! # Features
//!
//! - Authorization code hand-off with per-request state cookies
//! - Encrypted token cookies (AES-256-GCM, per-purpose keys)
//! - Refresh of tokens nearing expiry
//! - Storage of externally obtained provider payloads
//! - Open-redirect protection through a trusted domain resolver
//! - Microsoft Graph provider out of the box
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use delegated_token::{
//!     token_helper_config, AesGcmDataProtectionProvider, AllowListDomainResolver,
//!     HttpTokenBus, MicrosoftGraphConfig, MicrosoftGraphTokenHelper, ReqwestHttpTransport,
//!     TokenHelperBase, TokenHelperFactory, TokenKind, TracingLogger,
//! };
//!
//! let graph = MicrosoftGraphConfig::new(
//!     "https://login.microsoftonline.com/common/oauth2/v2.0".parse()?,
//!     "my-client-id",
//!     vec!["User.Read".into(), "offline_access".into()],
//! );
//! let bus = Arc::new(
//!     HttpTokenBus::new(
//!         graph.token_endpoint(),
//!         graph.client_id.clone(),
//!         Arc::new(ReqwestHttpTransport::new()?),
//!         Arc::new(TracingLogger::new()),
//!     )
//!     .with_client_secret("my-client-secret"),
//! );
//!
//! let helper = TokenHelperBase::new(
//!     MicrosoftGraphTokenHelper::new(graph, bus.clone(), bus),
//!     Arc::new(AesGcmDataProtectionProvider::new(master_key)?),
//!     Arc::new(AllowListDomainResolver::new(["app.example.com"])),
//!     token_helper_config().build()?,
//!     Arc::new(TracingLogger::new()),
//! );
//!
//! let helpers = TokenHelperFactory::new().register(Arc::new(helper));
//! let graph_helper = helpers.get(TokenKind::MicrosoftGraph)?;
//!
//! // In the "connect" action:
//! let outcome = graph_helper.authorize(&mut request, "https://app.example.com/reports").await?;
//! ```
//!
//! # Architecture
//!
//! - `types`: tokens, token sources, configuration and flow outcomes
//! - `error`: error hierarchy with provider error mapping
//! - `core`: request context, data protection, trusted domains, state, transport
//! - `builders`: fluent builders for tokens and configuration
//! - `token`: binary token format and the token creator
//! - `bus`: command/query buses reaching the provider token endpoint
//! - `helpers`: the per-kind token helper state machine and its registry
//! - `telemetry`: structured logging

pub mod builders;
pub mod bus;
pub mod core;
pub mod error;
pub mod helpers;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export helpers
pub use helpers::{
    MicrosoftGraphTokenHelper, TokenHelper, TokenHelperBase, TokenHelperFactory,
    TokenHelperProvider,
};

// Re-export builders
pub use builders::{token_helper_config, TokenBuilder, TokenHelperConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, parse_error_response, ArgumentError,
    ConfigurationError, NetworkError, OAuth2ErrorResponse, ProtectionError, ProtocolError,
    ProviderError, SerializationError, TokenLifecycleError, TokenResult, UnsupportedSourceError,
};

// Re-export types
pub use types::{
    // Token
    RefreshableToken, TokenKind,
    // Sources
    RefreshableTokenSource, TokenBasedCommand, TokenBasedQuery, TokenSource,
    // Config
    CookieOptions, MicrosoftGraphConfig, SameSite, TokenHelperConfig,
    // Outcomes
    BadRequestReason, CallbackParams, TokenFlowOutcome,
};

// Re-export core components
pub use crate::core::{
    // Request
    CookieWrite, InMemoryRequestContext, RequestContext,
    // Protection
    AesGcmDataProtectionProvider, DataProtectionProvider, DataProtector,
    MockDataProtectionProvider, STATE_PROTECTION_PURPOSE, TOKEN_PROTECTION_PURPOSE,
    // Trust
    AllowListDomainResolver, MockTrustedDomainResolver, TrustedDomainResolver,
    // State
    state_cookie_name, StateIdentifier,
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
};

// Re-export token management
pub use token::TokenCreator;

// Re-export buses
pub use bus::{
    HttpTokenBus, IssuedToken, MockTokenBus, TokenCommand, TokenCommandBus, TokenQuery,
    TokenQueryBus, TokenResponse,
};

// Re-export telemetry
pub use telemetry::{
    create_in_memory_logger, create_tracing_logger, no_op_logger, InMemoryLogger, LogEntry,
    LogLevel, Logger, NoOpLogger, TokenLogContext, TracingLogger,
};
