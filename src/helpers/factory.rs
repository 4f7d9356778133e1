//! Token Helper Factory
//!
//! Looks up the helper registered for a token kind.

use std::collections::HashMap;
use std::sync::Arc;

use super::TokenHelper;
use crate::error::{ConfigurationError, TokenResult};
use crate::types::TokenKind;

/// Registry of token helpers by kind.
#[derive(Default, Clone)]
pub struct TokenHelperFactory {
    helpers: HashMap<TokenKind, Arc<dyn TokenHelper>>,
}

impl TokenHelperFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `helper` under its own kind, replacing any earlier one.
    pub fn register(mut self, helper: Arc<dyn TokenHelper>) -> Self {
        self.helpers.insert(helper.token_kind(), helper);
        self
    }

    /// Helper for `kind`.
    pub fn get(&self, kind: TokenKind) -> TokenResult<Arc<dyn TokenHelper>> {
        self.helpers.get(&kind).cloned().ok_or_else(|| {
            ConfigurationError::HelperNotRegistered {
                kind: kind.to_string(),
            }
            .into()
        })
    }

    /// Kinds with a registered helper.
    pub fn kinds(&self) -> Vec<TokenKind> {
        self.helpers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockTokenBus;
    use crate::core::{InMemoryRequestContext, MockDataProtectionProvider, MockTrustedDomainResolver};
    use crate::error::TokenLifecycleError;
    use crate::helpers::{MicrosoftGraphTokenHelper, TokenHelperBase};
    use crate::telemetry::no_op_logger;
    use crate::types::{MicrosoftGraphConfig, TokenHelperConfig};
    use url::Url;

    fn graph_helper() -> Arc<dyn TokenHelper> {
        let bus = Arc::new(MockTokenBus::new());
        let provider = MicrosoftGraphTokenHelper::new(
            MicrosoftGraphConfig::new(
                Url::parse("https://login.microsoftonline.com/common/oauth2/v2.0").unwrap(),
                "client",
                vec!["User.Read".to_string()],
            ),
            bus.clone(),
            bus,
        );
        Arc::new(TokenHelperBase::new(
            provider,
            Arc::new(MockDataProtectionProvider::new()),
            Arc::new(MockTrustedDomainResolver::new(true)),
            TokenHelperConfig::default(),
            Arc::new(no_op_logger()),
        ))
    }

    #[test]
    fn test_unregistered_kind_is_a_configuration_error() {
        let err = match TokenHelperFactory::new().get(TokenKind::MicrosoftGraph) {
            Ok(_) => panic!("expected missing helper"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            TokenLifecycleError::Configuration(ConfigurationError::HelperNotRegistered { .. })
        ));
        assert!(err.to_string().contains("MicrosoftGraph"));
    }

    #[test]
    fn test_registered_helper_is_returned() {
        let factory = TokenHelperFactory::new().register(graph_helper());
        assert_eq!(factory.kinds(), vec![TokenKind::MicrosoftGraph]);

        let helper = factory.get(TokenKind::MicrosoftGraph).unwrap();
        let mut ctx = InMemoryRequestContext::get("https://app.example.com/").unwrap();
        let outcome = tokio_test::block_on(helper.authorize(&mut ctx, "https://app.example.com/home"))
            .unwrap();

        assert_eq!(outcome.status_code(), 302);
        assert_eq!(ctx.cookie_names().len(), 1);
    }
}
