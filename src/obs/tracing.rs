// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by runtime operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("fxiaoke_broker.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

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

/// Reports a failed attempt that will be retried after `delay`.
pub fn report_retry(kind: OpKind, attempt: u32, max_attempts: u32, delay: Duration, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		op = kind.as_str(),
		attempt,
		max_attempts,
		delay_ms = millis(delay),
		error = %err,
		"attempt failed; retrying"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, attempt, max_attempts, delay, err);
}

/// Reports that every attempt failed.
pub fn report_exhausted(kind: OpKind, attempts: u32, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(op = kind.as_str(), attempts, error = %err, "all attempts failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, attempts, err);
}

/// Reports that the rate gate is holding a caller back.
pub fn report_gate_wait(wait: Duration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(wait_ms = millis(wait), "rate gate delaying request");
	#[cfg(not(feature = "tracing"))]
	let _ = wait;
}

/// Reports a freshly cached credential and the delay until its scheduled refresh.
pub fn report_cached(ttl_seconds: i64, refresh_in: Option<Duration>) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		ttl_seconds,
		refresh_in_secs = refresh_in.map(|d| d.whole_seconds()),
		"corp access token cached"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (ttl_seconds, refresh_in);
}

/// Reports a provider-declared lifetime above the configured ceiling.
pub fn report_lifetime_exceeded(ttl_seconds: i64, max_seconds: i64) {
	#[cfg(feature = "tracing")]
	tracing::warn!(ttl_seconds, max_seconds, "provider token lifetime exceeds configured maximum");
	#[cfg(not(feature = "tracing"))]
	let _ = (ttl_seconds, max_seconds);
}

/// Reports a background refresh failure that is swallowed.
pub fn report_background_failure(err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::error!(error = %err, "scheduled token refresh failed; next acquire will retry");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

// Whole milliseconds, clamped into `u64`.
#[cfg(feature = "tracing")]
fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.whole_milliseconds().max(0)).unwrap_or(u64::MAX)
}
