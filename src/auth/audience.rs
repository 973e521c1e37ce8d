//! Validated audience identifiers naming the resource a token is scoped to.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const AUDIENCE_MAX_LEN: usize = 2048;

/// Error returned when audience validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum AudienceError {
	/// The audience was empty.
	#[error("Audience cannot be empty.")]
	Empty,
	/// The audience contains whitespace characters.
	#[error("Audience contains whitespace.")]
	ContainsWhitespace,
	/// The audience exceeded the allowed byte count.
	#[error("Audience exceeds {max} bytes.")]
	TooLong {
		/// Maximum permitted byte count.
		max: usize,
	},
}

/// Resource identifier a delegated token is requested for.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Audience(Cow<'static, str>);
impl Audience {
	/// Audience accepted by the managed document database service.
	pub const COSMOS_DB: Self = Self::from_static("https://cosmos.azure.com/");
	/// Audience accepted by the managed cognitive/AI services (embeddings, completions).
	pub const COGNITIVE_SERVICES: Self =
		Self::from_static("https://cognitiveservices.azure.com/.default");

	/// Creates a new audience after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, AudienceError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(Cow::Owned(view.to_owned())))
	}

	/// Returns the audience as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	const fn from_static(value: &'static str) -> Self {
		Self(Cow::Borrowed(value))
	}
}
impl Deref for Audience {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Audience {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Audience {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Audience> for String {
	fn from(value: Audience) -> Self {
		value.0.into_owned()
	}
}
impl TryFrom<String> for Audience {
	type Error = AudienceError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(Cow::Owned(value)))
	}
}
impl FromStr for Audience {
	type Err = AudienceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Audience {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Audience({})", self.0)
	}
}
impl Display for Audience {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(view: &str) -> Result<(), AudienceError> {
	if view.is_empty() {
		return Err(AudienceError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(AudienceError::ContainsWhitespace);
	}
	if view.len() > AUDIENCE_MAX_LEN {
		return Err(AudienceError::TooLong { max: AUDIENCE_MAX_LEN });
	}

	Ok(())
}
