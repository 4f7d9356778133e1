//! State Identifiers
//!
//! Correlation values binding an authorization request to its callback.

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::types::TokenKind;

/// Random correlation id sent to the provider as the `state` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateIdentifier(Uuid);

impl StateIdentifier {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the `state` value returned by a provider.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }
}

impl fmt::Display for StateIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

impl FromStr for StateIdentifier {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Name of the state cookie for one authorization of one token kind.
pub fn state_cookie_name(prefix: &str, kind: TokenKind, state: &StateIdentifier) -> String {
    format!("{}.{}.{}", prefix, kind, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(StateIdentifier::generate(), StateIdentifier::generate());
    }

    #[test]
    fn test_display_round_trips() {
        let state = StateIdentifier::generate();
        let text = state.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(StateIdentifier::parse(&text), Some(state));
        assert_eq!(text.parse::<StateIdentifier>().unwrap(), state);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(StateIdentifier::parse("not-a-state").is_none());
        assert!(StateIdentifier::parse("").is_none());
    }

    #[test]
    fn test_cookie_name_is_per_kind_and_state() {
        let state = StateIdentifier::parse("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(
            state_cookie_name(".Delegated.State", TokenKind::MicrosoftGraph, &state),
            ".Delegated.State.MicrosoftGraph.0123456789abcdef0123456789abcdef"
        );
    }
}
