//! Token Helper Base
//!
//! The per-kind token lifecycle: authorize, acquire, read, refresh, store and
//! log out. Provider specifics live behind [`TokenHelperProvider`].

use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use url::Url;

use crate::core::{
    state_cookie_name, DataProtectionProvider, HttpMethod, RequestContext, StateIdentifier,
    TrustedDomainResolver, STATE_PROTECTION_PURPOSE, TOKEN_PROTECTION_PURPOSE,
};
use crate::error::{ensure_not_blank, ProtectionError, TokenResult};
use crate::telemetry::{Logger, TokenLogContext};
use crate::token::TokenCreator;
use crate::types::{
    BadRequestReason, CallbackParams, RefreshableToken, TokenFlowOutcome, TokenHelperConfig,
    TokenKind,
};

/// Provider-specific seams of a token helper.
#[async_trait]
pub trait TokenHelperProvider: Send + Sync {
    /// Kind of token this provider issues.
    fn token_kind(&self) -> TokenKind;

    /// Name of the cookie holding the protected token.
    fn token_cookie_name(&self) -> String;

    /// Provider authorize URI carrying `state`.
    fn build_authorize_uri(
        &self,
        context: &dyn RequestContext,
        state: &StateIdentifier,
    ) -> TokenResult<Url>;

    /// State identifier returned on the callback, if any.
    fn resolve_state_identifier(&self, context: &dyn RequestContext) -> Option<StateIdentifier>;

    /// Redeem the authorization carried by the callback.
    async fn exchange_authorization_for_token(
        &self,
        context: &dyn RequestContext,
    ) -> TokenResult<RefreshableToken>;

    /// Redeem the refresh token of `expired`.
    async fn exchange_refresh_for_token(
        &self,
        context: &dyn RequestContext,
        expired: &RefreshableToken,
    ) -> TokenResult<RefreshableToken>;

    /// Interpret an externally obtained payload; `None` when it holds no token.
    async fn build_token_from_payload(
        &self,
        context: &dyn RequestContext,
        payload: &str,
    ) -> TokenResult<Option<RefreshableToken>>;
}

/// Token lifecycle operations for one token kind.
#[async_trait]
pub trait TokenHelper: Send + Sync {
    /// Kind handled by this helper.
    fn token_kind(&self) -> TokenKind;

    /// Start the provider hand-off.
    async fn authorize(
        &self,
        context: &mut dyn RequestContext,
        return_url: &str,
    ) -> TokenResult<TokenFlowOutcome>;

    /// Handle the provider callback.
    async fn acquire_token(&self, context: &mut dyn RequestContext)
        -> TokenResult<TokenFlowOutcome>;

    /// Currently stored token, if any.
    fn get_token(&self, context: &dyn RequestContext) -> TokenResult<Option<RefreshableToken>>;

    /// Replace the stored token through its refresh token.
    async fn refresh_token(
        &self,
        context: &mut dyn RequestContext,
        return_url: &str,
    ) -> TokenResult<TokenFlowOutcome>;

    /// Store a token obtained outside the authorize/callback flow.
    async fn store_token(
        &self,
        context: &mut dyn RequestContext,
        payload: &str,
    ) -> TokenResult<Option<RefreshableToken>>;

    /// Forget the stored token.
    fn handle_logout(&self, context: &mut dyn RequestContext);
}

/// Cookie-backed [`TokenHelper`] driving a [`TokenHelperProvider`].
///
/// The state cookie carries the protected return URL between `authorize` and
/// `acquire_token`; the token cookie carries the protected token bytes.
/// Cookie values are URL-safe base64 of the protected payload.
pub struct TokenHelperBase<P: TokenHelperProvider> {
    provider: P,
    protection: Arc<dyn DataProtectionProvider>,
    trusted_domains: Arc<dyn TrustedDomainResolver>,
    config: TokenHelperConfig,
    logger: Arc<dyn Logger>,
}

impl<P: TokenHelperProvider> TokenHelperBase<P> {
    /// Create a helper.
    pub fn new(
        provider: P,
        protection: Arc<dyn DataProtectionProvider>,
        trusted_domains: Arc<dyn TrustedDomainResolver>,
        config: TokenHelperConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            protection,
            trusted_domains,
            config,
            logger,
        }
    }

    /// Provider seams this helper drives.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Cookie and refresh settings.
    pub fn config(&self) -> &TokenHelperConfig {
        &self.config
    }

    /// True when `token` expires within the configured refresh window.
    pub fn needs_refresh(&self, token: &RefreshableToken) -> bool {
        token.will_expire_within(self.config.refresh_window())
    }

    fn log_context(&self, operation: &str) -> TokenLogContext {
        TokenLogContext::new()
            .token_kind(self.provider.token_kind().as_str())
            .operation(operation)
    }

    fn reject(&self, reason: BadRequestReason, context: &TokenLogContext) -> TokenFlowOutcome {
        self.logger.warn(
            &format!("Request rejected: {}", reason),
            &context.clone().extra("reason", format!("{:?}", reason)),
        );
        TokenFlowOutcome::bad_request(reason)
    }

    /// Parse and vet a caller supplied return URL.
    fn validate_return_url(
        &self,
        context: &dyn RequestContext,
        return_url: &str,
    ) -> Result<Url, BadRequestReason> {
        let url = Url::parse(return_url.trim()).map_err(|_| BadRequestReason::InvalidReturnUrl)?;

        if !self.trusted_domains.is_trusted_domain(&url) {
            return Err(BadRequestReason::UntrustedReturnUrl);
        }

        if context.method() != HttpMethod::Get {
            return Err(BadRequestReason::MethodNotAllowed);
        }

        Ok(url)
    }

    fn protect(&self, purpose: &str, plaintext: &[u8]) -> TokenResult<String> {
        let protected = self.protection.create_protector(purpose)?.protect(plaintext)?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(protected))
    }

    fn unprotect(&self, purpose: &str, cookie_value: &str) -> TokenResult<Vec<u8>> {
        let protected = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(cookie_value.trim())
            .map_err(|e| ProtectionError::MalformedPayload {
                purpose: purpose.to_string(),
                message: e.to_string(),
            })?;
        self.protection.create_protector(purpose)?.unprotect(&protected)
    }

    fn recover_return_url(&self, protected_state: &str) -> TokenResult<Url> {
        let plaintext = self.unprotect(STATE_PROTECTION_PURPOSE, protected_state)?;
        let malformed = |message: String| ProtectionError::MalformedPayload {
            purpose: STATE_PROTECTION_PURPOSE.to_string(),
            message,
        };
        let text = String::from_utf8(plaintext).map_err(|e| malformed(e.to_string()))?;
        Url::parse(&text).map_err(|e| malformed(e.to_string()).into())
    }

    /// Protect `token`, then write it under the token cookie.
    ///
    /// The cookie name is looked up only once the value is ready.
    fn write_token_cookie(
        &self,
        context: &mut dyn RequestContext,
        cookie_name: Option<String>,
        token: &RefreshableToken,
    ) -> TokenResult<()> {
        let value = self.protect(TOKEN_PROTECTION_PURPOSE, &token.to_byte_array())?;
        let cookie_name = cookie_name.unwrap_or_else(|| self.provider.token_cookie_name());
        context.set_cookie(&cookie_name, value, self.config.token_cookie_options());
        Ok(())
    }
}

#[async_trait]
impl<P: TokenHelperProvider> TokenHelper for TokenHelperBase<P> {
    fn token_kind(&self) -> TokenKind {
        self.provider.token_kind()
    }

    async fn authorize(
        &self,
        context: &mut dyn RequestContext,
        return_url: &str,
    ) -> TokenResult<TokenFlowOutcome> {
        ensure_not_blank(return_url, "return_url")?;
        let log = self.log_context("authorize");

        if let Err(reason) = self.validate_return_url(&*context, return_url) {
            return Ok(self.reject(reason, &log));
        }

        let state = StateIdentifier::generate();
        let protected = self.protect(STATE_PROTECTION_PURPOSE, return_url.as_bytes())?;
        let cookie_name = state_cookie_name(
            &self.config.state_cookie_prefix,
            self.provider.token_kind(),
            &state,
        );
        context.set_cookie(&cookie_name, protected, self.config.state_cookie_options());

        let authorize_uri = self.provider.build_authorize_uri(&*context, &state)?;
        self.logger.debug(
            "Redirecting to provider",
            &log.extra("provider_host", authorize_uri.host_str().unwrap_or_default()),
        );

        Ok(TokenFlowOutcome::Redirect(authorize_uri))
    }

    async fn acquire_token(
        &self,
        context: &mut dyn RequestContext,
    ) -> TokenResult<TokenFlowOutcome> {
        let log = self.log_context("acquire_token");

        let state = match self.provider.resolve_state_identifier(&*context) {
            Some(state) => state,
            None => return Ok(self.reject(BadRequestReason::MissingStateIdentifier, &log)),
        };

        let state_cookie = state_cookie_name(
            &self.config.state_cookie_prefix,
            self.provider.token_kind(),
            &state,
        );
        let protected_state = match context.cookie(&state_cookie) {
            Some(value) => value,
            None => return Ok(self.reject(BadRequestReason::MissingStateCookie, &log)),
        };

        let return_url = self.recover_return_url(&protected_state)?;
        context.delete_cookie(&state_cookie);

        if let Some(error) = CallbackParams::from_url(context.absolute_url()).error_summary() {
            self.logger.warn("Provider declined authorization", &log);
            return Ok(TokenFlowOutcome::Unauthorized { reason: error });
        }

        let token = match self.provider.exchange_authorization_for_token(&*context).await {
            Ok(token) => token,
            Err(e) => {
                self.logger.error(
                    &format!("Authorization exchange failed: {}", e),
                    &log.extra("error_code", e.error_code()),
                );
                return Err(e);
            }
        };

        self.write_token_cookie(context, None, &token)?;
        self.logger.info("Token acquired", &log);

        Ok(TokenFlowOutcome::Redirect(return_url))
    }

    fn get_token(&self, context: &dyn RequestContext) -> TokenResult<Option<RefreshableToken>> {
        let cookie_name = self.provider.token_cookie_name();
        let protected = match context.cookie(&cookie_name) {
            Some(value) => value,
            None => return Ok(None),
        };

        let bytes = self.unprotect(TOKEN_PROTECTION_PURPOSE, &protected)?;
        Ok(Some(TokenCreator::from_byte_array(&bytes)?))
    }

    async fn refresh_token(
        &self,
        context: &mut dyn RequestContext,
        return_url: &str,
    ) -> TokenResult<TokenFlowOutcome> {
        ensure_not_blank(return_url, "return_url")?;
        let log = self.log_context("refresh_token");

        let return_url = match self.validate_return_url(&*context, return_url) {
            Ok(url) => url,
            Err(reason) => return Ok(self.reject(reason, &log)),
        };

        let cookie_name = self.provider.token_cookie_name();
        let protected = match context.cookie(&cookie_name) {
            Some(value) => value,
            None => return Ok(self.reject(BadRequestReason::MissingTokenCookie, &log)),
        };

        let bytes = self.unprotect(TOKEN_PROTECTION_PURPOSE, &protected)?;
        let expired = TokenCreator::from_byte_array(&bytes)?;

        let token = match self.provider.exchange_refresh_for_token(&*context, &expired).await {
            Ok(token) => token,
            Err(e) => {
                self.logger.error(
                    &format!("Refresh exchange failed: {}", e),
                    &log.extra("error_code", e.error_code()),
                );
                return Err(e);
            }
        };

        self.write_token_cookie(context, Some(cookie_name), &token)?;
        self.logger.info("Token refreshed", &log);

        Ok(TokenFlowOutcome::Redirect(return_url))
    }

    async fn store_token(
        &self,
        context: &mut dyn RequestContext,
        payload: &str,
    ) -> TokenResult<Option<RefreshableToken>> {
        ensure_not_blank(payload, "payload")?;
        let log = self.log_context("store_token");

        let token = match self.provider.build_token_from_payload(&*context, payload).await? {
            Some(token) => token,
            None => {
                self.logger.debug("Payload carried no token", &log);
                return Ok(None);
            }
        };

        self.write_token_cookie(context, None, &token)?;
        self.logger.info("Token stored", &log);

        Ok(Some(token))
    }

    fn handle_logout(&self, context: &mut dyn RequestContext) {
        let cookie_name = self.provider.token_cookie_name();
        context.delete_cookie(&cookie_name);
        self.logger.info("Token cookie cleared", &self.log_context("handle_logout"));
    }
}
