//! Core Components
//!
//! Request, protection, trust, state and transport seams.

pub mod protection;
pub mod request;
pub mod state;
pub mod transport;
pub mod trusted_domain;

pub use protection::*;
pub use request::*;
pub use state::*;
pub use transport::*;
pub use trusted_domain::*;
