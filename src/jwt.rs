//! Compact token (`header.payload.signature`) payload decoding.
//!
//! Credentials only need the expiry, so this module reads the payload segment and never
//! verifies signatures; the downstream service remains responsible for validation. Issuers
//! commonly emit unpadded base64url, so padding is restored before decoding with the padded
//! URL-safe alphabet.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE};
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, error::MalformedTokenError};

/// `aud` claim, which issuers emit either as a single string or as an array.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClaimAudience {
	/// Single audience.
	One(String),
	/// Multiple audiences.
	Many(Vec<String>),
}
impl ClaimAudience {
	/// Returns `true` if `audience` is listed.
	pub fn contains(&self, audience: &str) -> bool {
		match self {
			Self::One(value) => value == audience,
			Self::Many(values) => values.iter().any(|value| value == audience),
		}
	}
}

/// Registered claims read from a token payload. Unknown claims are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
	/// Expiry as seconds since the Unix epoch.
	#[serde(default, deserialize_with = "numeric_date")]
	pub exp: Option<i64>,
	/// Issued-at as seconds since the Unix epoch.
	#[serde(default, deserialize_with = "numeric_date")]
	pub iat: Option<i64>,
	/// Not-before as seconds since the Unix epoch.
	#[serde(default, deserialize_with = "numeric_date")]
	pub nbf: Option<i64>,
	/// Intended audience(s).
	#[serde(default)]
	pub aud: Option<ClaimAudience>,
	/// Issuer.
	#[serde(default)]
	pub iss: Option<String>,
}
impl TokenClaims {
	/// Converts the `exp` claim into a UTC instant.
	pub fn expires_at(&self) -> Result<OffsetDateTime, MalformedTokenError> {
		let exp = self.exp.ok_or(MalformedTokenError::MissingExpiry)?;

		OffsetDateTime::from_unix_timestamp(exp)
			.map_err(|_| MalformedTokenError::ExpiryOutOfRange { exp })
	}
}

/// Appends `=` until the segment length is a multiple of four.
pub fn restore_padding(segment: &str) -> Cow<'_, str> {
	let missing = (4 - segment.len() % 4) % 4;

	if missing == 0 {
		return Cow::Borrowed(segment);
	}

	let mut padded = String::with_capacity(segment.len() + missing);

	padded.push_str(segment);
	padded.extend(std::iter::repeat_n('=', missing));

	Cow::Owned(padded)
}

/// Decodes the payload segment of a compact token into [`TokenClaims`].
pub fn decode_claims(token: &str) -> Result<TokenClaims, MalformedTokenError> {
	let payload = payload_segment(token)?;
	let bytes = URL_SAFE.decode(restore_padding(payload).as_bytes())?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	Ok(serde_path_to_error::deserialize(&mut de)?)
}

/// Decodes the `exp` claim of a compact token into a UTC instant.
pub fn decode_expiry(token: &str) -> Result<OffsetDateTime, MalformedTokenError> {
	decode_claims(token)?.expires_at()
}

fn payload_segment(token: &str) -> Result<&str, MalformedTokenError> {
	let mut segments = token.split('.');
	let _header = segments.next();

	segments.next().ok_or(MalformedTokenError::MissingPayload { segments: 1 })
}

// Accepts integral or fractional JSON numbers; fractions truncate toward zero.
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
		return Ok(None);
	};

	if let Some(value) = number.as_i64() {
		return Ok(Some(value));
	}

	match number.as_f64() {
		Some(value) if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
			Ok(Some(value.trunc() as i64)),
		_ => Err(D::Error::custom(format!("numeric date {number} is out of range"))),
	}
}
