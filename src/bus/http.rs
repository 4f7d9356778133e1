//! HTTP token bus backed by a provider token endpoint.

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{
    IssuedToken, TokenCommand, TokenCommandBus, TokenQuery, TokenQueryBus, TokenResponse,
};
use crate::core::{HttpMethod, HttpRequest, HttpTransport};
use crate::error::{create_error_from_response, parse_error_response, ProtocolError, TokenResult};
use crate::telemetry::{Logger, TokenLogContext};
use crate::types::{TokenBasedCommand, TokenBasedQuery};

/// Command and query bus talking to an OAuth2 token endpoint.
pub struct HttpTokenBus<T: HttpTransport> {
    token_endpoint: String,
    client_id: String,
    client_secret: Option<SecretString>,
    timeout: Duration,
    transport: Arc<T>,
    logger: Arc<dyn Logger>,
}

impl<T: HttpTransport> HttpTokenBus<T> {
    /// Create a bus for a public client.
    pub fn new(
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        transport: Arc<T>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: None,
            timeout: Duration::from_secs(30),
            transport,
            logger,
        }
    }

    /// Authenticate with HTTP Basic client credentials.
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request_body(&self, command: &TokenCommand) -> String {
        let mut params: Vec<(&str, String)> = match command {
            TokenCommand::AcquireToken {
                authorization_code,
                redirect_uri,
                scopes,
            } => {
                let mut params = vec![
                    ("grant_type", "authorization_code".to_string()),
                    ("code", authorization_code.expose_secret().clone()),
                    ("redirect_uri", redirect_uri.clone()),
                ];
                if !scopes.is_empty() {
                    params.push(("scope", scopes.join(" ")));
                }
                params
            }
            TokenCommand::RefreshToken {
                refresh_token,
                scopes,
            } => {
                let mut params = vec![
                    ("grant_type", "refresh_token".to_string()),
                    ("refresh_token", refresh_token.expose_secret().clone()),
                ];
                if !scopes.is_empty() {
                    params.push(("scope", scopes.join(" ")));
                }
                params
            }
        };
        params.push(("client_id", self.client_id.clone()));

        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish()
    }

    fn build_request_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        headers.insert("accept".to_string(), "application/json".to_string());

        if let Some(secret) = &self.client_secret {
            let credentials = format!("{}:{}", self.client_id, secret.expose_secret());
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            headers.insert("authorization".to_string(), format!("Basic {}", encoded));
        }

        headers
    }

    fn parse_token_response(body: &str) -> TokenResult<TokenResponse> {
        serde_json::from_str(body).map_err(|e| {
            ProtocolError::InvalidJson {
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl<T: HttpTransport> TokenCommandBus for HttpTokenBus<T> {
    async fn publish(&self, command: TokenCommand) -> TokenResult<Box<dyn TokenBasedCommand>> {
        let context = TokenLogContext::new()
            .operation(command.name())
            .extra("endpoint", self.token_endpoint.clone());
        self.logger.debug("Publishing token command", &context);

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: self.token_endpoint.clone(),
            headers: self.build_request_headers(),
            body: Some(self.build_request_body(&command)),
            timeout: Some(self.timeout),
        };

        let response = self.transport.send(request).await?;
        if response.status != 200 {
            let error = create_error_from_response(response.status, &response.body);
            self.logger.warn(
                &format!("Token endpoint rejected command: {}", error),
                &context.clone().extra("status", response.status.to_string()),
            );
            return Err(error);
        }

        let mut token_response = Self::parse_token_response(&response.body)?;

        // Providers may omit the refresh token when it is not rotated.
        if let TokenCommand::RefreshToken { refresh_token, .. } = &command {
            if token_response.refresh_token.is_none() {
                token_response.refresh_token = Some(refresh_token.expose_secret().clone());
            }
        }

        Ok(Box::new(IssuedToken::from_response(token_response, Utc::now())?))
    }
}

#[async_trait]
impl<T: HttpTransport> TokenQueryBus for HttpTokenBus<T> {
    async fn query(&self, query: TokenQuery) -> TokenResult<Option<Box<dyn TokenBasedQuery>>> {
        match query {
            TokenQuery::FromPayload { payload } => {
                if let Some(error) = parse_error_response(&payload) {
                    self.logger.warn(
                        "Payload is a provider error response",
                        &TokenLogContext::new()
                            .operation("from_payload")
                            .extra("error", error.error),
                    );
                    return Ok(None);
                }

                let token_response = Self::parse_token_response(&payload)?;
                Ok(Some(Box::new(IssuedToken::from_response(
                    token_response,
                    Utc::now(),
                )?)))
            }
        }
    }
}
