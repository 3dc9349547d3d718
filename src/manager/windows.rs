// self
use crate::{_prelude::*, config::serde_seconds, error::ConfigError};

/// Cache and refresh window settings, in seconds on the wire.
///
/// The fields must satisfy
/// `cache_min_time <= refresh_window_start <= refresh_window_end <= max_token_lifetime`.
/// A cached credential enters the proactive window once its remaining lifetime drops to
/// `refresh_window_start`; the scheduled refresh fires half the window width before expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshWindows {
	/// Minimum lifetime a cached token is expected to keep; validated only.
	#[serde(with = "serde_seconds")]
	pub cache_min_time: Duration,
	/// Remaining lifetime at which the proactive window opens.
	#[serde(with = "serde_seconds")]
	pub refresh_window_start: Duration,
	/// Upper edge of the proactive window.
	#[serde(with = "serde_seconds")]
	pub refresh_window_end: Duration,
	/// Longest lifetime the provider is expected to declare.
	#[serde(with = "serde_seconds")]
	pub max_token_lifetime: Duration,
	/// Minimum time between a refresh and the next proactive refresh.
	#[serde(with = "serde_seconds")]
	pub cooldown: Duration,
	/// Arms a background timer after every successful acquisition when `true`.
	pub proactive_refresh: bool,
}
impl RefreshWindows {
	/// Disables or enables the background refresh timer.
	pub fn with_proactive_refresh(mut self, enabled: bool) -> Self {
		self.proactive_refresh = enabled;

		self
	}

	/// Overrides the refresh cooldown.
	pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
		self.cooldown = cooldown;

		self
	}

	/// Checks that every duration is non-negative and the windows are ordered.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let all = [
			self.cache_min_time,
			self.refresh_window_start,
			self.refresh_window_end,
			self.max_token_lifetime,
			self.cooldown,
		];

		if all.iter().any(|d| d.is_negative()) {
			return Err(ConfigError::InvalidRefreshWindows { reason: "durations must not be negative" });
		}
		if self.cache_min_time > self.refresh_window_start {
			return Err(ConfigError::InvalidRefreshWindows {
				reason: "cache minimum time must not exceed the refresh window start",
			});
		}
		if self.refresh_window_start > self.refresh_window_end {
			return Err(ConfigError::InvalidRefreshWindows {
				reason: "refresh window start must not exceed its end",
			});
		}
		if self.refresh_window_end > self.max_token_lifetime {
			return Err(ConfigError::InvalidRefreshWindows {
				reason: "refresh window end must not exceed the maximum token lifetime",
			});
		}

		Ok(())
	}

	/// Delay before the scheduled refresh of a credential living `ttl`:
	/// `ttl - (end - start) / 2`, never shorter than the cooldown.
	pub fn refresh_delay(&self, ttl: Duration) -> Duration {
		let half_window: Duration = (self.refresh_window_end - self.refresh_window_start) / 2_i32;

		(ttl - half_window).max(self.cooldown).max(Duration::ZERO)
	}
}
impl Default for RefreshWindows {
	fn default() -> Self {
		Self {
			cache_min_time: Duration::seconds(6_600),
			refresh_window_start: Duration::seconds(6_650),
			refresh_window_end: Duration::seconds(7_200),
			max_token_lifetime: Duration::seconds(7_200),
			cooldown: Duration::seconds(60),
			proactive_refresh: true,
		}
	}
}
