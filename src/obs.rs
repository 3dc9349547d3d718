//! Optional observability helpers for runtime operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `fxiaoke_broker.op` with the `op`
//!   (operation) and `stage` (call site) fields, plus events for retries, gate waits, timer
//!   arming, and swallowed background failures.
//! - Enable `metrics` to increment the `fxiaoke_broker_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Runtime operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// On-demand credential acquisition.
	Acquire,
	/// Timer-driven credential refresh.
	ScheduledRefresh,
	/// Forced refresh that discards the cache first.
	ForceRefresh,
	/// Business request issued through the API client.
	Request,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Acquire => "acquire",
			OpKind::ScheduledRefresh => "scheduled_refresh",
			OpKind::ForceRefresh => "force_refresh",
			OpKind::Request => "request",
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
	/// Entry to a runtime operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller (or swallowed for background work).
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
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
