//! Token Management
//!
//! Serialization of [`RefreshableToken`](crate::types::RefreshableToken)s and
//! reconstruction from every supported source.

pub mod codec;
pub mod creator;

pub use creator::TokenCreator;
