//! Expiry-aware credential that bridges a host-delegated token into downstream clients.
//!
//! A [`DelegatedCredential`] lazily fetches a token for its audience from a [`TokenSource`],
//! decodes the `exp` claim, and hands the pair out until the clock enters the skew window
//! before expiry. The first caller to notice a stale (or missing) token takes a singleflight
//! guard and refetches; concurrent callers wait on the guard and then reuse the fresh value
//! instead of stampeding the host. Token and expiry live in one [`AccessToken`] that is
//! replaced as a whole, so readers never see a token paired with another fetch's expiry.
//!
//! Failures are never masked: a failed refetch returns the error even when an older token is
//! still cached.

pub mod clock;
pub mod registry;

mod metrics;

pub use clock::*;
pub use metrics::CredentialMetrics;
pub use registry::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Audience},
	jwt,
	obs::{self, CredentialEvent, CredentialSpan},
	source::TokenSource,
};

/// Credential that caches a delegated token and renews it shortly before expiry.
pub struct DelegatedCredential<S>
where
	S: ?Sized + TokenSource,
{
	audience: Audience,
	source: Arc<S>,
	skew: Duration,
	clock: Arc<dyn Clock>,
	cached: RwLock<Option<AccessToken>>,
	renewal: AsyncMutex<()>,
	metrics: CredentialMetrics,
}
impl<S> DelegatedCredential<S>
where
	S: ?Sized + TokenSource,
{
	/// Safety margin subtracted from the expiry when judging staleness.
	pub const DEFAULT_SKEW: Duration = Duration::seconds(60);

	/// Starts a builder for `audience` backed by `source`.
	pub fn builder(audience: Audience, source: Arc<S>) -> DelegatedCredentialBuilder<S> {
		DelegatedCredentialBuilder::new(audience, source)
	}

	/// Creates a credential with the default skew and the system clock.
	pub fn new(audience: Audience, source: Arc<S>) -> Self {
		Self::builder(audience, source).build()
	}

	/// Returns a token valid for at least the configured skew, fetching one when the cache is
	/// empty or stale.
	///
	/// # Errors
	///
	/// - [`Error::TokenSourceUnavailable`] when the host source fails.
	/// - [`Error::MalformedToken`] when the fetched token cannot be decoded.
	pub async fn get_token(&self) -> Result<AccessToken> {
		let span = CredentialSpan::new(&self.audience, "get_token");

		span.instrument(async move {
			if let Some(token) = self.fresh_cached() {
				return Ok(token);
			}

			let _singleflight = self.renewal.lock().await;

			// Another caller may have renewed while this one waited on the guard.
			if let Some(token) = self.fresh_cached() {
				return Ok(token);
			}

			self.renew().await
		})
		.await
	}

	/// Audience the credential requests tokens for.
	pub fn audience(&self) -> &Audience {
		&self.audience
	}

	/// Configured skew window.
	pub fn skew(&self) -> Duration {
		self.skew
	}

	/// Returns the cached token, stale or not, without contacting the source.
	pub fn cached(&self) -> Option<AccessToken> {
		self.cached.read().clone()
	}

	/// Drops the cached token so the next [`get_token`](Self::get_token) call refetches.
	pub fn invalidate(&self) {
		*self.cached.write() = None;
	}

	/// Per-credential fetch and cache counters.
	pub fn metrics(&self) -> &CredentialMetrics {
		&self.metrics
	}

	fn fresh_cached(&self) -> Option<AccessToken> {
		let now = self.clock.now_utc();
		let token = self.cached.read().clone().filter(|token| !token.is_stale_at(now, self.skew))?;

		self.metrics.record_cache_hit();
		obs::observe(&self.audience, CredentialEvent::CacheHit, Some(token.expires_at), None);

		Some(token)
	}

	async fn renew(&self) -> Result<AccessToken> {
		self.metrics.record_fetch();
		obs::observe(&self.audience, CredentialEvent::FetchStart, None, None);

		match self.fetch().await {
			Ok(token) => {
				*self.cached.write() = Some(token.clone());

				self.metrics.record_success();
				obs::observe(&self.audience, CredentialEvent::FetchSuccess, Some(token.expires_at), None);

				if token.is_stale_at(self.clock.now_utc(), self.skew) {
					obs::observe(
						&self.audience,
						CredentialEvent::StaleAfterFetch,
						Some(token.expires_at),
						None,
					);
				}

				Ok(token)
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::observe(&self.audience, CredentialEvent::FetchFailure, None, Some(&err));

				Err(err)
			},
		}
	}

	async fn fetch(&self) -> Result<AccessToken> {
		let token = self.source.fetch(&self.audience).await?;
		let expires_at = jwt::decode_expiry(token.expose())?;

		Ok(AccessToken { token, expires_at })
	}
}
impl<S> Debug for DelegatedCredential<S>
where
	S: ?Sized + TokenSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DelegatedCredential")
			.field("audience", &self.audience)
			.field("skew", &self.skew)
			.field("expires_at", &self.cached.read().as_ref().map(|token| token.expires_at))
			.finish()
	}
}

/// Builder for [`DelegatedCredential`].
pub struct DelegatedCredentialBuilder<S>
where
	S: ?Sized + TokenSource,
{
	audience: Audience,
	source: Arc<S>,
	skew: Duration,
	clock: Arc<dyn Clock>,
}
impl<S> DelegatedCredentialBuilder<S>
where
	S: ?Sized + TokenSource,
{
	fn new(audience: Audience, source: Arc<S>) -> Self {
		Self {
			audience,
			source,
			skew: DelegatedCredential::<S>::DEFAULT_SKEW,
			clock: Arc::new(SystemClock),
		}
	}

	/// Overrides the skew window (defaults to 60 seconds); negative values clamp to zero.
	pub fn skew(mut self, skew: Duration) -> Self {
		self.skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Overrides the clock used for staleness checks.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Produces an unfetched credential; the first [`get_token`](DelegatedCredential::get_token)
	/// call fetches.
	pub fn build(self) -> DelegatedCredential<S> {
		DelegatedCredential {
			audience: self.audience,
			source: self.source,
			skew: self.skew,
			clock: self.clock,
			cached: RwLock::new(None),
			renewal: AsyncMutex::new(()),
			metrics: CredentialMetrics::default(),
		}
	}

	/// Produces a credential and performs the initial fetch before returning it.
	pub async fn build_primed(self) -> Result<DelegatedCredential<S>> {
		let credential = self.build();

		credential.get_token().await?;

		Ok(credential)
	}
}
impl<S> Debug for DelegatedCredentialBuilder<S>
where
	S: ?Sized + TokenSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DelegatedCredentialBuilder")
			.field("audience", &self.audience)
			.field("skew", &self.skew)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
	use time::macros;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		error::{MalformedTokenError, TokenSourceError},
	};

	const ISSUED: OffsetDateTime = macros::datetime!(2025-09-16 18:00 UTC);

	fn credential(
		source: Arc<ScriptedTokenSource>,
		clock: Arc<ManualClock>,
	) -> DelegatedCredential<ScriptedTokenSource> {
		DelegatedCredential::builder(Audience::COSMOS_DB, source).clock(clock).build()
	}

	#[tokio::test]
	async fn first_call_fetches_and_decodes_expiry() {
		let expires = ISSUED + Duration::hours(1);
		let source = Arc::new(ScriptedTokenSource::new([Ok(mint_token(expires))]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source.clone(), clock);

		assert!(credential.cached().is_none());

		let token = credential.get_token().await.expect("First fetch should succeed.");

		assert_eq!(token.expires_at, expires);
		assert_eq!(token.expires_on(), expires.unix_timestamp());
		assert_eq!(source.calls(), 1);
		assert_eq!(source.audiences(), vec![Audience::COSMOS_DB]);
		assert_eq!(credential.cached(), Some(token));
	}

	#[tokio::test]
	async fn fresh_tokens_are_reused_until_the_skew_window() {
		let expires = ISSUED + Duration::hours(1);
		let source = Arc::new(ScriptedTokenSource::new([
			Ok(mint_token(expires)),
			Ok(mint_token(expires + Duration::hours(1))),
		]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source.clone(), clock.clone());
		let first = credential.get_token().await.expect("First fetch should succeed.");

		clock.set(expires - Duration::seconds(61));

		let reused = credential.get_token().await.expect("Cached token should be reused.");

		assert_eq!(reused, first);
		assert_eq!(source.calls(), 1);
		assert_eq!(credential.metrics().cache_hits(), 1);

		clock.set(expires - Duration::seconds(60));

		let renewed = credential.get_token().await.expect("Stale token should be renewed.");

		assert_eq!(renewed.expires_at, expires + Duration::hours(1));
		assert_ne!(renewed.token, first.token);
		assert_eq!(source.calls(), 2);
		assert_eq!(credential.metrics().fetches(), 2);
		assert_eq!(credential.metrics().successes(), 2);
	}

	#[tokio::test]
	async fn failed_renewal_never_returns_the_stale_token() {
		let expires = ISSUED + Duration::minutes(5);
		let source = Arc::new(ScriptedTokenSource::new([
			Ok(mint_token(expires)),
			Err(TokenSourceError::Status { status: 503, retry_after: None }),
			Ok(mint_token(expires + Duration::hours(1))),
		]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source.clone(), clock.clone());

		credential.get_token().await.expect("First fetch should succeed.");
		clock.set(expires);

		let err = credential.get_token().await.expect_err("Source failure must propagate.");

		assert!(err.is_source_unavailable());
		assert_eq!(credential.metrics().failures(), 1);

		let recovered = credential.get_token().await.expect("Next call should refetch.");

		assert_eq!(recovered.expires_at, expires + Duration::hours(1));
		assert_eq!(source.calls(), 3);
	}

	#[tokio::test]
	async fn malformed_tokens_are_not_cached() {
		let source = Arc::new(ScriptedTokenSource::new([Ok("not-a-token".into())]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source, clock);
		let err = credential.get_token().await.expect_err("Malformed token must be rejected.");

		assert!(matches!(
			err,
			Error::MalformedToken(MalformedTokenError::MissingPayload { segments: 1 })
		));
		assert!(credential.cached().is_none());
	}

	#[tokio::test]
	async fn invalidate_forces_a_refetch() {
		let expires = ISSUED + Duration::hours(1);
		let source = Arc::new(ScriptedTokenSource::new([
			Ok(mint_token(expires)),
			Ok(mint_token(expires + Duration::minutes(1))),
		]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source.clone(), clock);

		credential.get_token().await.expect("First fetch should succeed.");
		credential.invalidate();

		assert!(credential.cached().is_none());

		let token = credential.get_token().await.expect("Invalidated credential should refetch.");

		assert_eq!(token.expires_at, expires + Duration::minutes(1));
		assert_eq!(source.calls(), 2);
	}

	#[tokio::test]
	async fn tokens_issued_inside_the_window_are_still_returned() {
		let expires = ISSUED + Duration::seconds(30);
		let source = Arc::new(ScriptedTokenSource::new([Ok(mint_token(expires))]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source.clone(), clock);
		let token = credential.get_token().await.expect("Host-issued token should be returned.");

		assert_eq!(token.expires_at, expires);
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn extreme_expiries_and_skews_are_treated_as_stale() {
		let ancient = format!(
			"{}.{}.c2ln",
			URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
			URL_SAFE_NO_PAD.encode(br#"{"exp":-377705116800}"#)
		);
		let source = Arc::new(ScriptedTokenSource::new([
			Ok(ancient),
			Ok(mint_token(ISSUED + Duration::hours(1))),
		]));
		let clock = Arc::new(ManualClock::new(ISSUED));
		let credential = credential(source.clone(), clock.clone());
		let token = credential.get_token().await.expect("Host-issued token should be returned.");

		assert_eq!(token.expires_on(), -377_705_116_800);

		let renewed = credential.get_token().await.expect("Expired token should be renewed.");

		assert_eq!(renewed.expires_at, ISSUED + Duration::hours(1));
		assert_eq!(source.calls(), 2);

		let source = Arc::new(ScriptedTokenSource::new([
			Ok(mint_token(ISSUED + Duration::hours(1))),
			Ok(mint_token(ISSUED + Duration::hours(2))),
		]));
		let credential = DelegatedCredential::builder(Audience::COSMOS_DB, source.clone())
			.skew(Duration::days(365 * 20_000))
			.clock(clock)
			.build();

		credential.get_token().await.expect("First fetch should succeed.");
		credential.get_token().await.expect("Oversized skew should force a refetch.");

		assert_eq!(source.calls(), 2);
	}

	#[tokio::test]
	async fn builder_clamps_negative_skew_and_primes() {
		let expires = ISSUED + Duration::hours(1);
		let source = Arc::new(ScriptedTokenSource::new([Ok(mint_token(expires))]));
		let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(ISSUED));
		let credential = DelegatedCredential::builder(Audience::COGNITIVE_SERVICES, source.clone())
			.skew(Duration::seconds(-5))
			.clock(clock)
			.build_primed()
			.await
			.expect("Primed build should fetch once.");

		assert_eq!(credential.skew(), Duration::ZERO);
		assert_eq!(credential.audience(), &Audience::COGNITIVE_SERVICES);
		assert_eq!(credential.cached().map(|token| token.expires_at), Some(expires));
		assert_eq!(source.calls(), 1);
		assert!(!format!("{credential:?}").contains(&mint_token(expires)));
	}
}
