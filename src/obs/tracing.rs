// self
use crate::{_prelude::*, auth::Identity, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by cache operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the operation, stage, and identity.
	pub fn new(kind: OpKind, stage: &'static str, identity: &Identity) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"vehicle_token_cache.op",
				op = kind.as_str(),
				stage,
				identity = identity.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, identity);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
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

/// Emits a debug event inside the current span (when tracing is enabled).
pub(crate) fn debug_event(message: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = message;
	}
}

/// Emits a warning event carrying an error's display form (when tracing is enabled).
pub(crate) fn warn_event(message: &'static str, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_values_through() {
		let identity = Identity::new("fleet-1").expect("Identity fixture should be valid.");
		let span = OpSpan::new(OpKind::GetToken, "instrument_passes_values_through", &identity);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
