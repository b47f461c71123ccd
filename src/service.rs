//! Token service facade: cached fast path, single-flight acquisition, and cache maintenance.
//!
//! [`TokenService::get_token`] serves a cached token while `now < effective_expires_at`. On a
//! miss it joins (or starts) the identity's single flight, which performs exactly one upstream
//! acquisition and writes the result into the cache before any waiter is released. Failures are
//! handed to every waiter of that flight and are never cached, so the next call retries at once.

mod metrics;

pub use metrics::AcquisitionMetrics;

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	acquirer::TokenAcquirer,
	auth::{CachedToken, Identity, TokenLookup, TokenSecret},
	cache::{CacheStats, TokenCache},
	clock::{Clock, SystemClock},
	config::CacheConfig,
	error::AcquisitionError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	singleflight::{FlightRole, SingleFlight},
};
#[cfg(feature = "reqwest")]
use crate::{acquirer::ReqwestTokenAcquirer, auth::CredentialRegistry, config::AcquirerConfig};

#[cfg(feature = "reqwest")]
/// Service specialized for the crate's default reqwest acquirer.
pub type ReqwestTokenService = TokenService<ReqwestTokenAcquirer>;

/// Owned token cache facade shared by every consumer of the vehicle-data API.
///
/// Construct one per process and hand out clones; clones share the cache, the pending-flight
/// table, the clock, and the counters.
pub struct TokenService<A>
where
	A: ?Sized + TokenAcquirer,
{
	acquirer: Arc<A>,
	cache: TokenCache,
	flights: Arc<SingleFlight<Identity, Result<CachedToken>>>,
	clock: Arc<dyn Clock>,
	config: CacheConfig,
	metrics: Arc<AcquisitionMetrics>,
}
impl<A> TokenService<A>
where
	A: ?Sized + TokenAcquirer,
{
	/// Creates a service around `acquirer` using the system clock.
	pub fn new(acquirer: impl Into<Arc<A>>, config: CacheConfig) -> Self {
		Self {
			acquirer: acquirer.into(),
			cache: TokenCache::default(),
			flights: Default::default(),
			clock: Arc::new(SystemClock),
			config,
			metrics: Default::default(),
		}
	}

	/// Replaces the time source used for every expiry decision.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns a token for `identity`, acquiring one upstream only when no valid entry exists.
	pub async fn get_token(&self, identity: &Identity) -> Result<CachedToken> {
		const KIND: OpKind = OpKind::GetToken;

		if let Some(token) = self.cache.get_valid(identity, self.clock.now()) {
			self.metrics.record_cache_hit();
			obs::record_op_outcome(KIND, OpOutcome::CacheHit);

			return Ok(token);
		}

		let span = OpSpan::new(KIND, "get_token", identity);

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let (result, role) = span
			.instrument(
				self.flights.run_tracked(identity, || self.acquire_and_store(identity)),
			)
			.await;

		if role == FlightRole::Follower {
			self.metrics.record_coalesced();
			obs::record_op_outcome(KIND, OpOutcome::Coalesced);
		}

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Same as [`get_token`](Self::get_token) but flattened into the JSON-friendly
	/// [`TokenLookup`] shape.
	pub async fn lookup(&self, identity: &Identity) -> TokenLookup {
		self.get_token(identity).await.into()
	}

	/// Drops the cached entry for `identity`. Returns `true` if an entry was removed.
	pub fn invalidate(&self, identity: &Identity) -> bool {
		self.cache.invalidate(identity).is_some()
	}

	/// Drops the cached entry only while it still holds `rejected`, leaving any newer token
	/// installed by a concurrent refresh in place.
	pub fn invalidate_if_matches(&self, identity: &Identity, rejected: &TokenSecret) -> bool {
		self.cache.invalidate_if_matches(identity, rejected)
	}

	/// Counts cached and currently servable tokens.
	pub fn stats(&self) -> CacheStats {
		self.cache.stats_at(self.clock.now())
	}

	/// Empties the cache. Acquisitions already in flight still store their result.
	pub fn clear(&self) {
		self.cache.clear();
	}

	/// Number of identities with an acquisition in flight.
	pub fn in_flight(&self) -> usize {
		self.flights.in_flight()
	}

	/// Counters describing how tokens were served.
	pub fn metrics(&self) -> &AcquisitionMetrics {
		&self.metrics
	}

	/// Expiry policy in use.
	pub fn config(&self) -> &CacheConfig {
		&self.config
	}

	/// Time source in use.
	pub fn clock(&self) -> &Arc<dyn Clock> {
		&self.clock
	}

	/// Underlying acquirer.
	pub fn acquirer(&self) -> &Arc<A> {
		&self.acquirer
	}

	/// Drops a token the downstream API rejected and counts the forced refresh that follows.
	pub(crate) fn discard_rejected(&self, identity: &Identity, rejected: &TokenSecret) -> bool {
		self.metrics.record_forced_refresh();

		self.cache.invalidate_if_matches(identity, rejected)
	}

	async fn acquire_and_store(&self, identity: &Identity) -> Result<CachedToken> {
		const KIND: OpKind = OpKind::Acquire;

		// A flight that resolved between our miss and our attach may already have stored a
		// token for this stale window.
		if let Some(token) = self.cache.get_valid(identity, self.clock.now()) {
			return Ok(token);
		}

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.record_attempt();

		let started = Instant::now();
		let result = self.acquire_fresh(identity).await;

		obs::record_acquire_latency(started.elapsed());

		match &result {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);
				obs::record_cache_stats(self.cache.stats_at(self.clock.now()));
				obs::debug_event("Stored a freshly acquired token.");
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				obs::warn_event("Token acquisition failed.", err);
			},
		}

		result
	}

	async fn acquire_fresh(&self, identity: &Identity) -> Result<CachedToken> {
		let raw = <A as TokenAcquirer>::acquire(self.acquirer.as_ref(), identity).await?;
		let buffer = self.config.buffer();

		if raw.access_token.is_blank() {
			return Err(AcquisitionError::EmptyAccessToken.into());
		}
		if raw.expires_in <= buffer {
			return Err(
				AcquisitionError::ExpiresWithinBuffer { expires_in: raw.expires_in, buffer }.into()
			);
		}

		let token = CachedToken::new(
			identity.clone(),
			raw.access_token,
			self.clock.now(),
			raw.expires_in,
			buffer,
		)?;

		self.cache.put(token.clone());

		Ok(token)
	}
}
#[cfg(feature = "reqwest")]
impl TokenService<ReqwestTokenAcquirer> {
	/// Creates a service backed by the default reqwest acquirer.
	pub fn reqwest(
		acquirer_config: AcquirerConfig,
		credentials: CredentialRegistry,
		config: CacheConfig,
	) -> Result<Self> {
		let acquirer = ReqwestTokenAcquirer::new(acquirer_config, credentials)?;

		Ok(Self::new(acquirer, config))
	}
}
impl<A> Clone for TokenService<A>
where
	A: ?Sized + TokenAcquirer,
{
	fn clone(&self) -> Self {
		Self {
			acquirer: self.acquirer.clone(),
			cache: self.cache.clone(),
			flights: self.flights.clone(),
			clock: self.clock.clone(),
			config: self.config,
			metrics: self.metrics.clone(),
		}
	}
}
impl<A> Debug for TokenService<A>
where
	A: ?Sized + TokenAcquirer,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenService")
			.field("config", &self.config)
			.field("cached", &self.cache.len())
			.field("in_flight", &self.flights.in_flight())
			.finish()
	}
}
