//! Callback Types
//!
//! Parameters the provider appends to the callback request.

use url::Url;

/// Callback parameters from the provider redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// State parameter.
    pub state: Option<String>,
    /// Error code (if authorization failed).
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse callback parameters from URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                _ => {}
            }
        }

        params
    }

    /// Error code and description joined for display.
    pub fn error_summary(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(match &self.error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_params_from_url() {
        let url = Url::parse("https://example.com/callback?code=abc123&state=xyz789").unwrap();
        let params = CallbackParams::from_url(&url);

        assert_eq!(params.state, Some("xyz789".to_string()));
        assert!(params.error.is_none());
        assert!(params.error_summary().is_none());
    }

    #[test]
    fn test_callback_params_error() {
        let url = Url::parse(
            "https://example.com/callback?error=access_denied&error_description=User%20denied",
        )
        .unwrap();
        let params = CallbackParams::from_url(&url);

        assert!(params.state.is_none());
        assert_eq!(
            params.error_summary(),
            Some("access_denied: User denied".to_string())
        );
    }
}
