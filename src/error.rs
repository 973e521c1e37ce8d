//! Crate-level error types shared by credentials, token sources, and decoders.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by [`DelegatedCredential::get_token`](crate::credential::DelegatedCredential::get_token).
///
/// Only two kinds reach callers of the credential: the host could not hand out a token, or the
/// token it handed out cannot be decoded. Neither is retried locally.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The host token source could not be reached or returned an error.
	#[error("Host token source is unavailable: {0}")]
	TokenSourceUnavailable(#[from] TokenSourceError),
	/// The fetched token could not be decoded into an expiry.
	#[error("Host token source returned a malformed token: {0}")]
	MalformedToken(#[from] MalformedTokenError),
}
impl Error {
	/// Returns `true` when the failure came from the host token source.
	pub fn is_source_unavailable(&self) -> bool {
		matches!(self, Self::TokenSourceUnavailable(_))
	}

	/// Returns `true` when the host returned an undecodable token.
	pub fn is_malformed_token(&self) -> bool {
		matches!(self, Self::MalformedToken(_))
	}
}

/// Failures raised while contacting the host token source.
#[derive(Debug, ThisError)]
pub enum TokenSourceError {
	/// Underlying transport reported a network failure.
	#[error("Network error occurred while calling the host token source.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within the configured timeout.
	#[error("Host token source did not respond within {timeout}.")]
	Timeout {
		/// Timeout that elapsed.
		timeout: Duration,
	},
	/// Host answered with a non-success HTTP status.
	#[error("Host token source answered with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from the host, if supplied.
		retry_after: Option<Duration>,
	},
	/// Host answered successfully but the body did not carry a token.
	#[error("Host token source response did not contain a token.")]
	EmptyToken,
	/// Host response body could not be parsed.
	#[error("Host token source returned an unreadable response.")]
	Response {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Plain-text body is not valid UTF-8.
	#[error("Host token source returned a body that is not valid UTF-8.")]
	NotUtf8(#[from] std::str::Utf8Error),
	/// Custom source failure.
	#[error("{message}")]
	Other {
		/// Human-readable failure description.
		message: String,
	},
}
impl TokenSourceError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a free-form failure for custom sources.
	pub fn other(message: impl Into<String>) -> Self {
		Self::Other { message: message.into() }
	}
}

/// Reasons a compact token cannot be decoded into an expiry.
#[derive(Debug, ThisError)]
pub enum MalformedTokenError {
	/// Token has fewer than two dot-separated segments.
	#[error("Token has {segments} segment(s); a payload segment is required.")]
	MissingPayload {
		/// Number of segments found.
		segments: usize,
	},
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload bytes are not a JSON claims object.
	#[error("Token payload is not a valid claims object.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Payload lacks a numeric `exp` claim.
	#[error("Token payload is missing the exp claim.")]
	MissingExpiry,
	/// The `exp` claim cannot be represented as a UTC instant.
	#[error("Token exp claim {exp} is out of range.")]
	ExpiryOutOfRange {
		/// Raw claim value.
		exp: i64,
	},
	/// Token contains characters that cannot travel in an HTTP header.
	#[error("Token cannot be used as an HTTP header value.")]
	NotHeaderSafe,
}

/// Construction-time configuration failures, returned by builders only.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured header name or value is not valid HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Endpoint URL cannot carry query parameters.
	#[error("Endpoint `{url}` cannot be used as a token source.")]
	InvalidEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
