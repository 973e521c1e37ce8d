//! Host token sources: the service that issues a delegated token for an audience.
//!
//! A [`TokenSource`] performs exactly one operation, "get token for audience", and returns the
//! opaque token string. Credentials decide when to call it; sources never cache or retry.

#[cfg(feature = "reqwest")] pub mod http;

#[cfg(feature = "reqwest")] pub use http::*;

// self
use crate::{
	_prelude::*,
	auth::{Audience, TokenSecret},
	error::TokenSourceError,
};

/// Boxed future returned by [`TokenSource::fetch`].
pub type TokenSourceFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenSecret, TokenSourceError>> + 'a + Send>>;

/// Host-provided issuer of delegated bearer tokens.
///
/// Implementations must be `Send + Sync + 'static` so one source can back several
/// credentials (one per audience) across executor threads.
pub trait TokenSource
where
	Self: 'static + Send + Sync,
{
	/// Requests a fresh token scoped to `audience`.
	fn fetch<'a>(&'a self, audience: &'a Audience) -> TokenSourceFuture<'a>;
}

/// Adapts an async closure into a [`TokenSource`].
///
/// Handy for hosts that expose token retrieval as a plain function call rather than an
/// HTTP endpoint.
pub struct FnTokenSource<F>(F);
impl<F, Fut> FnTokenSource<F>
where
	F: 'static + Send + Sync + Fn(Audience) -> Fut,
	Fut: 'static + Send + Future<Output = Result<String, TokenSourceError>>,
{
	/// Wraps `f`; it receives an owned copy of the requested audience.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, Fut> TokenSource for FnTokenSource<F>
where
	F: 'static + Send + Sync + Fn(Audience) -> Fut,
	Fut: 'static + Send + Future<Output = Result<String, TokenSourceError>>,
{
	fn fetch<'a>(&'a self, audience: &'a Audience) -> TokenSourceFuture<'a> {
		let fut = (self.0)(audience.clone());

		Box::pin(async move { fut.await.map(TokenSecret::from) })
	}
}
impl<F> Debug for FnTokenSource<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnTokenSource(..)")
	}
}
