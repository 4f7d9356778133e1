//! Builders
//!
//! Fluent builders for tokens and helper configuration.

pub mod config;
pub mod token;

pub use config::{token_helper_config, TokenHelperConfigBuilder};
pub use token::TokenBuilder;
