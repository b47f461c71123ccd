//! Optional observability helpers for cache operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `vehicle_token_cache.op` with the `op`
//!   (operation) and `stage` (call site) fields. Bearer tokens never appear in span fields.
//! - Enable `metrics` to increment the `vehicle_token_cache_op_total` counter for every
//!   attempt/outcome, labeled by `op` + `outcome`. Token exchanges also feed the
//!   `vehicle_token_cache_acquire_seconds` histogram, and every stored token refreshes the
//!   `vehicle_token_cache_tokens{state}` occupancy gauges.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// `TokenService::get_token`.
	GetToken,
	/// A single upstream acquisition.
	Acquire,
	/// `TokenService::call_with_auth`.
	CallWithAuth,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::GetToken => "get_token",
			OpKind::Acquire => "acquire",
			OpKind::CallWithAuth => "call_with_auth",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// A valid cached token was served without coordination.
	CacheHit,
	/// The caller reused another caller's in-flight acquisition.
	Coalesced,
	/// A downstream rejection forced a refresh and a second call.
	Retried,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::CacheHit => "cache_hit",
			OpOutcome::Coalesced => "coalesced",
			OpOutcome::Retried => "retried",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
