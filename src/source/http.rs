//! HTTP-backed host token source.
//!
//! Many hosts expose delegated tokens through a local or metadata endpoint: a `GET` with the
//! audience in the query string returns either a JSON document carrying the token or the bare
//! token as text. [`HttpTokenSource`] covers both shapes, bounds every request with a timeout,
//! and classifies failures into [`TokenSourceError`] values so credentials can surface them as
//! `TokenSourceUnavailable`.

// crates.io
use reqwest::{
	header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::{Audience, TokenSecret},
	error::{ConfigError, TokenSourceError},
	source::{TokenSource, TokenSourceFuture},
};

const DEFAULT_AUDIENCE_PARAM: &str = "resource";
const DEFAULT_TOKEN_FIELD: &str = "access_token";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the host encodes the token in a successful response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenResponseFormat {
	/// JSON object with the token under `field`; a bare JSON string is accepted as well.
	Json {
		/// Object key holding the token.
		field: String,
	},
	/// Body is the token itself; surrounding whitespace is trimmed.
	PlainText,
}
impl TokenResponseFormat {
	fn extract(&self, body: &[u8]) -> Result<String, TokenSourceError> {
		let token = match self {
			Self::PlainText => std::str::from_utf8(body)?.trim().to_owned(),
			Self::Json { field } => {
				let mut de = serde_json::Deserializer::from_slice(body);
				let value: serde_json::Value = serde_path_to_error::deserialize(&mut de)
					.map_err(|source| TokenSourceError::Response { source })?;

				match value {
					serde_json::Value::String(token) => token,
					serde_json::Value::Object(mut object) => match object.remove(field) {
						Some(serde_json::Value::String(token)) => token,
						_ => return Err(TokenSourceError::EmptyToken),
					},
					_ => return Err(TokenSourceError::EmptyToken),
				}
			},
		};

		if token.is_empty() {
			return Err(TokenSourceError::EmptyToken);
		}

		Ok(token)
	}
}
impl Default for TokenResponseFormat {
	fn default() -> Self {
		Self::Json { field: DEFAULT_TOKEN_FIELD.into() }
	}
}

/// Serializable settings for [`HttpTokenSource`], suitable for loading from a host config file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTokenSourceConfig {
	/// Token endpoint; the audience is appended as a query parameter.
	pub endpoint: Url,
	/// Query parameter carrying the audience.
	#[serde(default = "default_audience_param")]
	pub audience_param: String,
	/// Static headers sent with every request (e.g. a host session bearer).
	#[serde(default)]
	pub headers: BTreeMap<String, String>,
	/// Per-request timeout in seconds.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
	/// Response body format.
	#[serde(default)]
	pub format: TokenResponseFormat,
}
impl HttpTokenSourceConfig {
	/// Creates a config for `endpoint` with every other field defaulted.
	pub fn new(endpoint: Url) -> Self {
		Self {
			endpoint,
			audience_param: default_audience_param(),
			headers: BTreeMap::new(),
			timeout_secs: default_timeout_secs(),
			format: TokenResponseFormat::default(),
		}
	}
}
impl Debug for HttpTokenSourceConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenSourceConfig")
			.field("endpoint", &self.endpoint.as_str())
			.field("audience_param", &self.audience_param)
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("timeout_secs", &self.timeout_secs)
			.field("format", &self.format)
			.finish()
	}
}

/// Token source that fetches delegated tokens from a host HTTP endpoint.
///
/// Redirects are never followed; a host token endpoint answers directly.
#[derive(Clone)]
pub struct HttpTokenSource {
	client: ReqwestClient,
	endpoint: Url,
	audience_param: String,
	headers: HeaderMap,
	timeout: Duration,
	format: TokenResponseFormat,
}
impl HttpTokenSource {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(DEFAULT_TIMEOUT_SECS as i64);

	/// Starts a builder for `endpoint`.
	pub fn builder(endpoint: Url) -> HttpTokenSourceBuilder {
		HttpTokenSourceBuilder::new(endpoint)
	}

	/// Builds a source from serialized settings.
	pub fn from_config(config: HttpTokenSourceConfig) -> Result<Self, ConfigError> {
		let HttpTokenSourceConfig { endpoint, audience_param, headers, timeout_secs, format } =
			config;
		let timeout = i64::try_from(timeout_secs)
			.map(Duration::seconds)
			.unwrap_or(Self::DEFAULT_TIMEOUT);
		let mut builder = Self::builder(endpoint)
			.audience_param(audience_param)
			.timeout(timeout)
			.format(format);

		for (name, value) in headers {
			builder = builder.header(name, value);
		}

		builder.build()
	}

	/// Endpoint the source calls.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Per-request timeout.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	fn request_url(&self, audience: &Audience) -> Url {
		let mut url = self.endpoint.clone();

		url.query_pairs_mut().append_pair(&self.audience_param, audience.as_str());

		url
	}

	fn map_send_error(&self, err: ReqwestError) -> TokenSourceError {
		if err.is_timeout() {
			TokenSourceError::Timeout { timeout: self.timeout }
		} else {
			TokenSourceError::network(err)
		}
	}
}
impl TokenSource for HttpTokenSource {
	fn fetch<'a>(&'a self, audience: &'a Audience) -> TokenSourceFuture<'a> {
		Box::pin(async move {
			let response = self
				.client
				.get(self.request_url(audience))
				.headers(self.headers.clone())
				.timeout(self.timeout.unsigned_abs())
				.send()
				.await
				.map_err(|err| self.map_send_error(err))?;
			let status = response.status();

			if !status.is_success() {
				return Err(TokenSourceError::Status {
					status: status.as_u16(),
					retry_after: parse_retry_after(response.headers()),
				});
			}

			let body = response.bytes().await.map_err(|err| self.map_send_error(err))?;

			self.format.extract(&body).map(TokenSecret::from)
		})
	}
}
impl Debug for HttpTokenSource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenSource")
			.field("endpoint", &self.endpoint.as_str())
			.field("audience_param", &self.audience_param)
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("timeout", &self.timeout)
			.field("format", &self.format)
			.finish()
	}
}

/// Builder for [`HttpTokenSource`].
#[derive(Debug)]
pub struct HttpTokenSourceBuilder {
	endpoint: Url,
	audience_param: String,
	headers: Vec<(String, String)>,
	timeout: Duration,
	format: TokenResponseFormat,
	client: Option<ReqwestClient>,
}
impl HttpTokenSourceBuilder {
	fn new(endpoint: Url) -> Self {
		Self {
			endpoint,
			audience_param: default_audience_param(),
			headers: Vec::new(),
			timeout: HttpTokenSource::DEFAULT_TIMEOUT,
			format: TokenResponseFormat::default(),
			client: None,
		}
	}

	/// Overrides the query parameter carrying the audience (defaults to `resource`).
	pub fn audience_param(mut self, name: impl Into<String>) -> Self {
		self.audience_param = name.into();

		self
	}

	/// Adds a static header sent with every request.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Overrides the per-request timeout; non-positive values keep the default.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		if timeout.is_positive() {
			self.timeout = timeout;
		}

		self
	}

	/// Overrides the response body format.
	pub fn format(mut self, format: TokenResponseFormat) -> Self {
		self.format = format;

		self
	}

	/// Supplies a preconfigured reqwest client. Configure it to not follow redirects.
	pub fn client(mut self, client: ReqwestClient) -> Self {
		self.client = Some(client);

		self
	}

	/// Validates the settings and produces the source.
	pub fn build(self) -> Result<HttpTokenSource, ConfigError> {
		if self.endpoint.cannot_be_a_base() {
			return Err(ConfigError::InvalidEndpoint { url: self.endpoint.to_string() });
		}

		let mut headers = HeaderMap::new();

		for (name, value) in self.headers {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;
			let mut header_value = HeaderValue::from_str(&value)
				.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;

			header_value.set_sensitive(true);
			headers.append(header_name, header_value);
		}

		let client = match self.client {
			Some(client) => client,
			None => ReqwestClient::builder().redirect(Policy::none()).build()?,
		};

		Ok(HttpTokenSource {
			client,
			endpoint: self.endpoint,
			audience_param: self.audience_param,
			headers,
			timeout: self.timeout,
			format: self.format,
		})
	}
}

fn default_audience_param() -> String {
	DEFAULT_AUDIENCE_PARAM.into()
}

fn default_timeout_secs() -> u64 {
	DEFAULT_TIMEOUT_SECS
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return (secs >= 0).then(|| Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
