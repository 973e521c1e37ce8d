//! Audience identifiers, redacted secrets, and cached access tokens.

pub mod audience;
pub mod secret;
pub mod token;

pub use audience::*;
pub use secret::*;
pub use token::*;
