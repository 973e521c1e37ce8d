//! Downstream client contracts (bearer token providers, request signing).
//!
//! Clients that need per-request credentials depend on [`BearerTokenProvider`] rather than a
//! concrete credential type, and use a [`RequestSignerExt`] implementation such as
//! [`BearerAuth`] to place the token on outbound requests.

pub mod request_signer;
pub mod token_provider;

pub use request_signer::*;
pub use token_provider::*;
