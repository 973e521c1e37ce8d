//! Request signing contracts that attach credential-issued tokens to outbound requests.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	RequestBuilder,
	header::{AUTHORIZATION, HeaderValue},
};
// self
use crate::{_prelude::*, auth::AccessToken};
#[cfg(feature = "reqwest")]
use crate::{error::MalformedTokenError, ext::BearerTokenProvider};

/// Describes how to attach an [`AccessToken`] to an outbound request without constraining the
/// HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects authorization state derived from `token`.
	fn attach_token(&self, request: Request, token: &AccessToken) -> Result<Request, Error>;
}

/// Builds the `Authorization: Bearer <token>` header value, marked sensitive.
#[cfg(feature = "reqwest")]
pub fn bearer_header(token: &AccessToken) -> Result<HeaderValue> {
	let mut value = HeaderValue::try_from(format!("Bearer {}", token.token.expose()))
		.map_err(|_| MalformedTokenError::NotHeaderSafe)?;

	value.set_sensitive(true);

	Ok(value)
}

/// Signs reqwest requests with tokens from a [`BearerTokenProvider`].
#[cfg(feature = "reqwest")]
pub struct BearerAuth<P>
where
	P: ?Sized + BearerTokenProvider,
{
	provider: Arc<P>,
}
#[cfg(feature = "reqwest")]
impl<P> BearerAuth<P>
where
	P: ?Sized + BearerTokenProvider,
{
	/// Wraps `provider`.
	pub fn new(provider: Arc<P>) -> Self {
		Self { provider }
	}

	/// Fetches a current token and renders it as an `Authorization` header value.
	pub async fn header_value(&self) -> Result<HeaderValue> {
		let token = self.provider.bearer_token().await?;

		bearer_header(&token)
	}

	/// Fetches a current token and attaches it to `request`.
	pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
		let token = self.provider.bearer_token().await?;

		self.attach_token(request, &token)
	}
}
#[cfg(feature = "reqwest")]
impl<P> RequestSignerExt<RequestBuilder, Error> for BearerAuth<P>
where
	P: ?Sized + BearerTokenProvider,
{
	fn attach_token(&self, request: RequestBuilder, token: &AccessToken) -> Result<RequestBuilder> {
		Ok(request.header(AUTHORIZATION, bearer_header(token)?))
	}
}
#[cfg(feature = "reqwest")]
impl<P> Clone for BearerAuth<P>
where
	P: ?Sized + BearerTokenProvider,
{
	fn clone(&self) -> Self {
		Self { provider: self.provider.clone() }
	}
}
#[cfg(feature = "reqwest")]
impl<P> Debug for BearerAuth<P>
where
	P: ?Sized + BearerTokenProvider,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BearerAuth(..)")
	}
}
