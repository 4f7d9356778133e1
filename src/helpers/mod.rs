//! Token Helpers
//!
//! Per-kind token lifecycle state machines and their registry.

mod base;
mod factory;
mod graph;

pub use base::{TokenHelper, TokenHelperBase, TokenHelperProvider};
pub use factory::TokenHelperFactory;
pub use graph::MicrosoftGraphTokenHelper;
