//! Minimum-interval gate spacing outbound business requests.
//!
//! The provider throttles per window; the gate approximates "one request per window" by
//! enforcing `now - last_request_at >= min_interval` between consecutive callers. Concurrent
//! callers each reserve the next free slot under a short lock and then sleep outside it, so
//! spacing never collapses below `min_interval` no matter how many tasks contend.

// self
use crate::{_prelude::*, clock::Clock, config::serde_millis, error::ConfigError, obs};

/// Largest accepted spacing between consecutive requests.
pub const MAX_MIN_INTERVAL: Duration = Duration::DAY;

/// Rate gate settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateConfig {
	/// Minimum spacing between consecutive requests.
	#[serde(rename = "minIntervalMs", with = "serde_millis")]
	pub min_interval: Duration,
}
impl RateConfig {
	/// Creates a config with the provided spacing.
	pub fn new(min_interval: Duration) -> Self {
		Self { min_interval }
	}

	/// Rejects negative intervals and intervals above [`MAX_MIN_INTERVAL`]; zero disables the
	/// gate.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.min_interval.is_negative() {
			return Err(ConfigError::InvalidRateConfig { reason: "min interval must not be negative" });
		}
		if self.min_interval > MAX_MIN_INTERVAL {
			return Err(ConfigError::InvalidRateConfig { reason: "min interval must not exceed one day" });
		}

		Ok(())
	}
}
impl Default for RateConfig {
	fn default() -> Self {
		Self { min_interval: Duration::milliseconds(20_000) }
	}
}

/// Minimum-interval gate.
pub struct RateGate {
	clock: Arc<dyn Clock>,
	min_interval: Duration,
	last_request_at: Mutex<Option<OffsetDateTime>>,
}
impl RateGate {
	/// Creates a gate after validating `config`.
	pub fn new(config: &RateConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { clock, min_interval: config.min_interval, last_request_at: Mutex::new(None) })
	}

	/// Returns the enforced spacing.
	pub fn min_interval(&self) -> Duration {
		self.min_interval
	}

	/// Returns the instant reserved by the most recent caller, if any.
	pub fn last_request_at(&self) -> Option<OffsetDateTime> {
		*self.last_request_at.lock()
	}

	/// Suspends until the caller's slot arrives. The first call never waits.
	pub async fn wait(&self) {
		let wait = self.reserve();

		if wait.is_positive() {
			obs::report_gate_wait(wait);

			self.clock.sleep(wait).await;
		}
	}

	// Claims `max(now, last + min_interval)` and returns how long to sleep until then.
	fn reserve(&self) -> Duration {
		let now = self.clock.now();
		let mut last = self.last_request_at.lock();
		let slot = match *last {
			Some(prev) => prev.saturating_add(self.min_interval).max(now),
			None => now,
		};

		*last = Some(slot);

		slot - now
	}
}
impl Debug for RateGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateGate")
			.field("min_interval", &self.min_interval)
			.field("last_request_at", &self.last_request_at())
			.finish()
	}
}
