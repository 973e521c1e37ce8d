//! Optional observability helpers for credential renewal.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to run every `get_token` call inside a span named
//!   `delegated_credential.get_token` with an `audience` field, and to log each
//!   [`CredentialEvent`] with structured `audience`/`expires_at` fields.
//! - Enable `metrics` to increment the `delegated_credential_events_total` counter for every
//!   event, labeled by `audience` + `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::Audience, error::Error};

/// Points in the credential lifecycle that are reported to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialEvent {
	/// A fetch from the host token source is starting.
	FetchStart,
	/// A fetched token was decoded and cached.
	FetchSuccess,
	/// A fetch or decode failed and the error was propagated.
	FetchFailure,
	/// A cached token was still fresh and returned without a fetch.
	CacheHit,
	/// A freshly fetched token already sits inside the skew window.
	StaleAfterFetch,
}
impl CredentialEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialEvent::FetchStart => "fetch_start",
			CredentialEvent::FetchSuccess => "fetch_success",
			CredentialEvent::FetchFailure => "fetch_failure",
			CredentialEvent::CacheHit => "cache_hit",
			CredentialEvent::StaleAfterFetch => "stale_after_fetch",
		}
	}
}
impl Display for CredentialEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Reports `event` to the enabled observers.
pub fn observe(
	audience: &Audience,
	event: CredentialEvent,
	expires_at: Option<OffsetDateTime>,
	error: Option<&Error>,
) {
	log_event(audience, event, expires_at, error);
	record_event(audience, event);
}
