// self
use crate::{_prelude::*, auth::Audience, error::Error, obs::CredentialEvent};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapping a single credential call.
#[derive(Clone, Debug)]
pub struct CredentialSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CredentialSpan {
	/// Creates a new span tagged with the audience + call site.
	pub fn new(audience: &Audience, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!(
				"delegated_credential.get_token",
				audience = audience.as_str(),
				stage
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (audience, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a credential event with structured fields (when enabled).
pub fn log_event(
	audience: &Audience,
	event: CredentialEvent,
	expires_at: Option<OffsetDateTime>,
	error: Option<&Error>,
) {
	#[cfg(feature = "tracing")]
	{
		let audience = audience.as_str();
		let expires_at = expires_at.map(|instant| instant.unix_timestamp());

		match event {
			CredentialEvent::FetchFailure => tracing::warn!(
				audience,
				event = event.as_str(),
				error = error.map(tracing::field::display),
				"Delegated token fetch failed."
			),
			CredentialEvent::StaleAfterFetch => tracing::warn!(
				audience,
				event = event.as_str(),
				expires_at,
				"Host issued a token that is already inside the renewal window."
			),
			_ => tracing::debug!(audience, event = event.as_str(), expires_at, "Credential event."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (audience, event, expires_at, error);
	}
}
