//! Token Types
//!
//! Data types shared by the token helpers.

pub mod callback;
pub mod config;
pub mod outcome;
pub mod source;
pub mod token;

pub use callback::*;
pub use config::*;
pub use outcome::*;
pub use source::*;
pub use token::*;
