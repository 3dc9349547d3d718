//! Bounded retry with exponential backoff.
//!
//! [`Executor::run`] drives an operation through at most [`RetryPolicy::max_attempts`]
//! attempts. An attempt fails when the operation returns an error (transport, malformed
//! response) or when the provider envelope carries a non-zero `errorCode`. Between attempts
//! the executor awaits the delay produced by [`Backoff`]; no delay follows the final attempt.
//! Configuration errors are fatal and surface immediately.

// self
use crate::{
	_prelude::*,
	api::{ApiPayload, ApiResponse},
	clock::Clock,
	config::serde_millis,
	error::ConfigError,
	obs::{self, OpKind},
};

/// Immutable retry configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
	/// Total attempts including the first one (≥ 1).
	pub max_attempts: u32,
	/// Delay applied after the first failed attempt.
	#[serde(rename = "baseDelayMs", with = "serde_millis")]
	pub base_delay: Duration,
	/// Growth factor applied per attempt (> 1).
	pub backoff_multiplier: f64,
}
impl RetryPolicy {
	/// Creates a policy after validating its bounds.
	pub fn new(
		max_attempts: u32,
		base_delay: Duration,
		backoff_multiplier: f64,
	) -> Result<Self, ConfigError> {
		let policy = Self { max_attempts, base_delay, backoff_multiplier };

		policy.validate()?;

		Ok(policy)
	}

	/// Checks `max_attempts ≥ 1`, a non-negative base delay, and a multiplier above 1.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_attempts == 0 {
			return Err(ConfigError::InvalidRetryPolicy { reason: "max attempts must be at least 1" });
		}
		if self.base_delay.is_negative() {
			return Err(ConfigError::InvalidRetryPolicy { reason: "base delay must not be negative" });
		}
		if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier > 1.) {
			return Err(ConfigError::InvalidRetryPolicy {
				reason: "backoff multiplier must be greater than 1",
			});
		}

		Ok(())
	}

	/// Delay awaited after failed attempt `attempt` (1-indexed):
	/// `base_delay × backoff_multiplier^(attempt - 1)`, saturating at [`Duration::MAX`].
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
		let factor = self.backoff_multiplier.powi(exponent);

		// A zero base delay stays zero even when the factor overflows to infinity.
		if self.base_delay.is_zero() {
			return Duration::ZERO;
		}

		Duration::saturating_seconds_f64(self.base_delay.as_seconds_f64() * factor)
	}

	/// Iterator over the inter-attempt delays; yields `max_attempts - 1` values.
	pub fn delays(&self) -> Backoff {
		Backoff { policy: self.clone(), attempt: 0 }
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: 3, base_delay: Duration::milliseconds(1_000), backoff_multiplier: 2. }
	}
}

/// Explicit iterator over attempt indices producing the delay to await after each failure.
#[derive(Clone, Debug)]
pub struct Backoff {
	policy: RetryPolicy,
	attempt: u32,
}
impl Iterator for Backoff {
	type Item = Duration;

	fn next(&mut self) -> Option<Self::Item> {
		if self.attempt.saturating_add(1) >= self.policy.max_attempts {
			return None;
		}

		self.attempt += 1;

		Some(self.policy.delay_for(self.attempt))
	}
}

/// Runs operations with bounded retry and exponential backoff.
#[derive(Clone)]
pub struct Executor {
	policy: RetryPolicy,
	clock: Arc<dyn Clock>,
}
impl Executor {
	/// Creates an executor that sleeps on `clock` between attempts.
	pub fn new(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
		Self { policy, clock }
	}

	/// Returns the policy applied by this executor.
	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// Invokes `operation` until it yields a successful envelope or attempts run out.
	///
	/// Business failures ([`ApiResponse::Failure`]) count as failed attempts. After the final
	/// failure the last error is wrapped in [`Error::RetryExhausted`].
	pub async fn run<F, Fut>(&self, kind: OpKind, mut operation: F) -> Result<ApiPayload>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<ApiResponse>>,
	{
		let mut delays = self.policy.delays();
		let mut attempt = 0;

		loop {
			attempt += 1;

			let err = match operation().await.and_then(ApiResponse::into_payload) {
				Ok(payload) => return Ok(payload),
				Err(err) if !err.is_retryable() => return Err(err),
				Err(err) => err,
			};

			match delays.next() {
				Some(delay) => {
					obs::report_retry(kind, attempt, self.policy.max_attempts, delay, &err);

					self.clock.sleep(delay).await;
				},
				None => {
					obs::report_exhausted(kind, attempt, &err);

					return Err(Error::RetryExhausted { attempts: attempt, source: Box::new(err) });
				},
			}
		}
	}
}
impl Debug for Executor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Executor").field("policy", &self.policy).finish()
	}
}
