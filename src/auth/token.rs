//! Cached access token paired with its decoded expiry.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token handed out by a credential together with the expiry decoded from its payload.
///
/// Both fields come from the same fetch; credentials replace the whole value at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer token; callers must avoid logging it.
	pub token: TokenSecret,
	/// Absolute UTC expiry taken from the token's `exp` claim.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Pairs a token with its expiry.
	pub fn new(token: impl Into<TokenSecret>, expires_at: OffsetDateTime) -> Self {
		Self { token: token.into(), expires_at }
	}

	/// Expiry as seconds since the Unix epoch.
	pub fn expires_on(&self) -> i64 {
		self.expires_at.unix_timestamp()
	}

	/// Returns `true` once `now` has entered the `skew` window before expiry.
	///
	/// Compares the remaining lifetime against `skew`, which holds for any representable expiry
	/// and skew.
	pub fn is_stale_at(&self, now: OffsetDateTime, skew: Duration) -> bool {
		self.remaining_at(now) <= skew
	}

	/// Time left until expiry at `now`; negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}
}
