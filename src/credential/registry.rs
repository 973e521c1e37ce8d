//! Per-audience credential sharing on top of one host token source.

// self
use crate::{
	_prelude::*,
	auth::Audience,
	credential::{Clock, DelegatedCredential, SystemClock},
	source::TokenSource,
};

/// Hands out one shared [`DelegatedCredential`] per audience.
///
/// A process typically talks to a handful of services (a database and a model endpoint, say)
/// through one host token source. The registry creates each audience's credential on first
/// request and returns the same instance afterwards, so every client targeting that audience
/// shares one cache and one renewal guard.
pub struct CredentialRegistry<S>
where
	S: ?Sized + TokenSource,
{
	source: Arc<S>,
	skew: Duration,
	clock: Arc<dyn Clock>,
	credentials: Mutex<HashMap<Audience, Arc<DelegatedCredential<S>>>>,
}
impl<S> CredentialRegistry<S>
where
	S: ?Sized + TokenSource,
{
	/// Creates an empty registry backed by `source`.
	pub fn new(source: Arc<S>) -> Self {
		Self {
			source,
			skew: DelegatedCredential::<S>::DEFAULT_SKEW,
			clock: Arc::new(SystemClock),
			credentials: Default::default(),
		}
	}

	/// Overrides the skew applied to credentials created from now on.
	pub fn with_skew(mut self, skew: Duration) -> Self {
		self.skew = skew;

		self
	}

	/// Overrides the clock handed to credentials created from now on.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns (and creates on demand) the credential for `audience`.
	pub fn credential(&self, audience: &Audience) -> Arc<DelegatedCredential<S>> {
		let mut credentials = self.credentials.lock();

		credentials
			.entry(audience.clone())
			.or_insert_with(|| {
				Arc::new(
					DelegatedCredential::builder(audience.clone(), self.source.clone())
						.skew(self.skew)
						.clock(self.clock.clone())
						.build(),
				)
			})
			.clone()
	}

	/// Number of audiences with a credential.
	pub fn len(&self) -> usize {
		self.credentials.lock().len()
	}

	/// Returns `true` when no credential has been requested yet.
	pub fn is_empty(&self) -> bool {
		self.credentials.lock().is_empty()
	}
}
impl<S> Debug for CredentialRegistry<S>
where
	S: ?Sized + TokenSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRegistry")
			.field("skew", &self.skew)
			.field("audiences", &self.credentials.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}
