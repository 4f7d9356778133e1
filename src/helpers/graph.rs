//! Microsoft Graph Token Helper
//!
//! Authorization code flow against the Microsoft identity platform.

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use url::Url;

use super::TokenHelperProvider;
use crate::bus::{TokenCommand, TokenCommandBus, TokenQuery, TokenQueryBus};
use crate::core::{RequestContext, StateIdentifier};
use crate::error::{ConfigurationError, ProtocolError, TokenResult};
use crate::token::TokenCreator;
use crate::types::{MicrosoftGraphConfig, RefreshableToken, TokenKind};

/// Provider seams for Microsoft Graph delegated tokens.
pub struct MicrosoftGraphTokenHelper {
    config: MicrosoftGraphConfig,
    commands: Arc<dyn TokenCommandBus>,
    queries: Arc<dyn TokenQueryBus>,
}

impl MicrosoftGraphTokenHelper {
    /// Create the provider.
    pub fn new(
        config: MicrosoftGraphConfig,
        commands: Arc<dyn TokenCommandBus>,
        queries: Arc<dyn TokenQueryBus>,
    ) -> Self {
        Self {
            config,
            commands,
            queries,
        }
    }

    /// Provider registration settings.
    pub fn config(&self) -> &MicrosoftGraphConfig {
        &self.config
    }

    /// Callback URI on the origin serving the current request.
    pub fn redirect_uri(&self, context: &dyn RequestContext) -> TokenResult<Url> {
        context
            .absolute_url()
            .join(&self.config.callback_path)
            .map_err(|e| {
                ConfigurationError::InvalidConfig {
                    message: format!("callback_path '{}': {}", self.config.callback_path, e),
                }
                .into()
            })
    }
}

#[async_trait]
impl TokenHelperProvider for MicrosoftGraphTokenHelper {
    fn token_kind(&self) -> TokenKind {
        TokenKind::MicrosoftGraph
    }

    fn token_cookie_name(&self) -> String {
        self.config.token_cookie_name.clone()
    }

    fn build_authorize_uri(
        &self,
        context: &dyn RequestContext,
        state: &StateIdentifier,
    ) -> TokenResult<Url> {
        let mut uri = Url::parse(&self.config.authorization_endpoint()).map_err(|e| {
            ConfigurationError::InvalidConfig {
                message: format!("authority: {}", e),
            }
        })?;
        let redirect_uri = self.redirect_uri(context)?;

        uri.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("response_mode", "query")
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", &state.to_string());

        Ok(uri)
    }

    fn resolve_state_identifier(&self, context: &dyn RequestContext) -> Option<StateIdentifier> {
        context
            .query_param("state")
            .and_then(|state| StateIdentifier::parse(&state))
    }

    async fn exchange_authorization_for_token(
        &self,
        context: &dyn RequestContext,
    ) -> TokenResult<RefreshableToken> {
        let code = context
            .query_param("code")
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| ProtocolError::MissingField {
                field: "code".to_string(),
            })?;

        let reply = self
            .commands
            .publish(TokenCommand::AcquireToken {
                authorization_code: SecretString::new(code),
                redirect_uri: self.redirect_uri(context)?.to_string(),
                scopes: self.config.scopes.clone(),
            })
            .await?;

        TokenCreator::from_token_based_command(Some(reply.as_ref()))
    }

    async fn exchange_refresh_for_token(
        &self,
        _context: &dyn RequestContext,
        expired: &RefreshableToken,
    ) -> TokenResult<RefreshableToken> {
        let reply = self
            .commands
            .publish(TokenCommand::RefreshToken {
                refresh_token: SecretString::new(expired.refresh_token().to_string()),
                scopes: self.config.scopes.clone(),
            })
            .await?;

        TokenCreator::from_token_based_command(Some(reply.as_ref()))
    }

    async fn build_token_from_payload(
        &self,
        _context: &dyn RequestContext,
        payload: &str,
    ) -> TokenResult<Option<RefreshableToken>> {
        let reply = self
            .queries
            .query(TokenQuery::FromPayload {
                payload: payload.to_string(),
            })
            .await?;

        match reply {
            Some(reply) => Ok(Some(TokenCreator::from_token_based_query(Some(
                reply.as_ref(),
            ))?)),
            None => Ok(None),
        }
    }
}
