// self
use crate::{auth::Audience, obs::CredentialEvent};

/// Records a credential event via the global metrics recorder (when enabled).
pub fn record_event(audience: &Audience, event: CredentialEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"delegated_credential_events_total",
			"audience" => audience.to_string(),
			"event" => event.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (audience, event);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_event_without_recorder_is_noop() {
		record_event(&Audience::COSMOS_DB, CredentialEvent::CacheHit);
	}
}
