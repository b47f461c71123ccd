// std
use std::time::Duration as StdDuration;
// self
use crate::{
	cache::CacheStats,
	obs::{OpKind, OpOutcome},
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"vehicle_token_cache_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how long one upstream token exchange took, whatever its outcome.
pub fn record_acquire_latency(elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("vehicle_token_cache_acquire_seconds").record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = elapsed;
	}
}

/// Publishes cache occupancy as `vehicle_token_cache_tokens{state="total"|"valid"}` gauges.
///
/// Validity is time-relative, so the gauges reflect the instant the snapshot was taken.
pub fn record_cache_stats(stats: CacheStats) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("vehicle_token_cache_tokens", "state" => "total")
			.set(stats.total_tokens as f64);
		metrics::gauge!("vehicle_token_cache_tokens", "state" => "valid")
			.set(stats.valid_tokens as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = stats;
	}
}
