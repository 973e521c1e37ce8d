//! Object-safe access to bearer tokens for downstream clients.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	credential::DelegatedCredential,
	source::TokenSource,
};

/// Boxed future returned by [`BearerTokenProvider::bearer_token`].
pub type BearerTokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Anything that can produce a currently valid bearer token on demand.
///
/// Downstream clients call this once per outbound request (or per connection); implementations
/// decide whether that means a cache hit or a fetch.
pub trait BearerTokenProvider
where
	Self: Send + Sync,
{
	/// Returns a token that is safe to attach to a request right now.
	fn bearer_token(&self) -> BearerTokenFuture<'_>;
}
impl<S> BearerTokenProvider for DelegatedCredential<S>
where
	S: ?Sized + TokenSource,
{
	fn bearer_token(&self) -> BearerTokenFuture<'_> {
		Box::pin(self.get_token())
	}
}
impl<T> BearerTokenProvider for Arc<T>
where
	T: ?Sized + BearerTokenProvider,
{
	fn bearer_token(&self) -> BearerTokenFuture<'_> {
		(**self).bearer_token()
	}
}
