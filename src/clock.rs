//! Injectable time source used by the executor, rate gate, and credential manager.
//!
//! Every component reads "now" and suspends through a [`Clock`] so timing-sensitive
//! behavior (validity, refresh windows, backoff, gate spacing) can be exercised
//! deterministically. [`TokioClock`] derives wall-clock instants from the tokio timer, which
//! means tests that pause tokio time observe consistent `now()` values as well.

// crates.io
use tokio::time::Instant;
// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type ClockFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Time source + timer provider.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current wall-clock instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends for `duration`; zero or negative durations resolve immediately.
	fn sleep(&self, duration: Duration) -> ClockFuture;
}

/// Default clock driven by the tokio timer.
///
/// The wall-clock anchor is captured at construction and advanced by the tokio
/// monotonic clock, so `now()` never jumps backwards and follows `tokio::time::pause`.
#[derive(Clone, Debug)]
pub struct TokioClock {
	anchor_wall: OffsetDateTime,
	anchor: Instant,
}
impl TokioClock {
	/// Creates a clock anchored at the current instant.
	pub fn new() -> Self {
		Self { anchor_wall: OffsetDateTime::now_utc(), anchor: Instant::now() }
	}
}
impl Default for TokioClock {
	fn default() -> Self {
		Self::new()
	}
}
impl Clock for TokioClock {
	fn now(&self) -> OffsetDateTime {
		let elapsed = Instant::now().saturating_duration_since(self.anchor);

		self.anchor_wall + elapsed
	}

	fn sleep(&self, duration: Duration) -> ClockFuture {
		let duration = to_std(duration);

		Box::pin(async move {
			if !duration.is_zero() {
				tokio::time::sleep(duration).await;
			}
		})
	}
}

/// Converts a signed [`Duration`] into a std duration, clamping negatives to zero.
pub(crate) fn to_std(duration: Duration) -> std::time::Duration {
	std::time::Duration::try_from(duration).unwrap_or_default()
}
