//! Corp access token lifecycle: cache, on-demand acquisition, and scheduled refresh.
//!
//! [`CredentialManager`] owns the single cached [`Credential`] of an enterprise identity.
//! [`CredentialManager::acquire`] serves the cache while the token is valid and otherwise runs
//! the token fetch through the retry [`Executor`]. A per-manager single-flight guard collapses
//! concurrent fetches: callers that waited on the guard re-check the cache and reuse the
//! token the winner just stored. After every successful fetch a one-shot timer is armed so
//! the token is replaced shortly before it expires; timer failures are reported and swallowed.

mod metrics;
mod timer;
mod windows;

pub use metrics::CredentialMetrics;
pub use windows::RefreshWindows;

// std
use std::sync::{
	Weak,
	atomic::{AtomicBool, Ordering},
};
// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	api::{TOKEN_ENDPOINT, TokenGrant},
	auth::{Credential, CredentialSnapshot, Identity},
	clock::Clock,
	error::ConfigError,
	http::{self, Transport},
	manager::timer::TimerSlot,
	obs::{self, OpKind, OpOutcome, OpSpan},
	retry::Executor,
};

type TimerTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Shared handle to a credential cache; clones observe the same state.
///
/// Dropping the last handle cancels the armed refresh timer.
#[derive(Clone)]
pub struct CredentialManager {
	inner: Arc<Inner>,
}
impl CredentialManager {
	/// Creates a manager with an empty cache after validating `windows`.
	///
	/// The identity is checked lazily so a manager can be assembled before credentials are
	/// provisioned; [`acquire`](Self::acquire) reports missing parameters.
	pub fn new(
		identity: Identity,
		windows: RefreshWindows,
		executor: Executor,
		transport: Arc<dyn Transport>,
		clock: Arc<dyn Clock>,
	) -> Result<Self, ConfigError> {
		windows.validate()?;

		Ok(Self {
			inner: Arc::new(Inner {
				identity,
				windows,
				executor,
				transport,
				clock,
				cache: Default::default(),
				timer: Default::default(),
				flight: AsyncMutex::new(()),
				closed: AtomicBool::new(false),
				metrics: Default::default(),
			}),
		})
	}

	/// Identity used for token fetches.
	pub fn identity(&self) -> &Identity {
		&self.inner.identity
	}

	/// Window settings in effect.
	pub fn windows(&self) -> &RefreshWindows {
		&self.inner.windows
	}

	/// Acquisition counters.
	pub fn metrics(&self) -> &CredentialMetrics {
		&self.inner.metrics
	}

	/// Returns a valid credential, fetching one when the cache is empty or expired.
	pub async fn acquire(&self) -> Result<Credential> {
		const KIND: OpKind = OpKind::Acquire;

		self.observe(KIND, "acquire", self.obtain(KIND, false)).await
	}

	/// Discards the cache and timer, then acquires a fresh credential.
	///
	/// A failed fetch leaves the cache empty.
	pub async fn force_refresh(&self) -> Result<Credential> {
		const KIND: OpKind = OpKind::ForceRefresh;

		self.clear();
		self.observe(KIND, "force_refresh", self.obtain(KIND, false)).await
	}

	/// Returns `true` when a token is cached and `now - issued_at < ttl`.
	pub fn is_valid(&self) -> bool {
		self.valid_cached().is_some()
	}

	/// Returns `true` when the cached token is valid, its remaining lifetime is inside the
	/// refresh window, and the cooldown since the last refresh has elapsed.
	pub fn needs_proactive_refresh(&self) -> bool {
		let now = self.inner.clock.now();
		let windows = &self.inner.windows;

		self.inner.cache.lock().as_ref().is_some_and(|credential| {
			credential.is_valid_at(now)
				&& credential.remaining_at(now) <= windows.refresh_window_start
				&& credential.since_refresh_at(now) >= windows.cooldown
		})
	}

	/// Side-effect-free view of the cache.
	pub fn current_snapshot(&self) -> CredentialSnapshot {
		let now = self.inner.clock.now();

		self.inner
			.cache
			.lock()
			.as_ref()
			.map(|credential| credential.snapshot_at(now))
			.unwrap_or_default()
	}

	/// Returns `true` while a scheduled refresh is pending.
	pub fn is_timer_armed(&self) -> bool {
		self.inner.timer.lock().is_armed()
	}

	/// Cancels the timer and clears the cache; no timer is armed afterwards. Idempotent.
	pub fn shutdown(&self) {
		self.inner.closed.store(true, Ordering::SeqCst);
		self.clear();
	}

	/// Returns `true` once [`shutdown`](Self::shutdown) ran.
	pub fn is_shut_down(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	fn clear(&self) {
		self.inner.timer.lock().cancel();

		*self.inner.cache.lock() = None;
	}

	fn valid_cached(&self) -> Option<Credential> {
		let now = self.inner.clock.now();

		self.inner.cache.lock().as_ref().filter(|credential| credential.is_valid_at(now)).cloned()
	}

	async fn observe<F>(&self, kind: OpKind, stage: &'static str, fut: F) -> Result<Credential>
	where
		F: Future<Output = Result<Credential>>,
	{
		let span = OpSpan::new(kind, stage);

		obs::record_op_outcome(kind, OpOutcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_op_outcome(kind, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(kind, OpOutcome::Failure),
		}

		result
	}

	// `replace_valid` is set by the timer: a still-valid token is replaced unless another
	// caller refreshed it after this call started.
	async fn obtain(&self, kind: OpKind, replace_valid: bool) -> Result<Credential> {
		let inner = &self.inner;

		inner.identity.validate()?;

		let requested_at = inner.clock.now();

		if let Some(credential) = self.valid_cached().filter(|_| !replace_valid) {
			inner.metrics.record_cache_hit();

			return Ok(credential);
		}

		let _flight = inner.flight.lock().await;

		if let Some(credential) = self
			.valid_cached()
			.filter(|credential| !replace_valid || credential.last_refresh_at > requested_at)
		{
			inner.metrics.record_cache_hit();

			return Ok(credential);
		}

		self.fetch_and_cache(kind).await
	}

	async fn fetch_and_cache(&self, kind: OpKind) -> Result<Credential> {
		let inner = &self.inner;
		let body = inner.identity.token_request_body()?;

		inner.metrics.record_attempt();

		let grant = inner
			.executor
			.run(kind, || http::fetch_envelope(inner.transport.as_ref(), TOKEN_ENDPOINT, &body))
			.await
			.and_then(|payload| payload.with_endpoint(TOKEN_ENDPOINT).decode::<TokenGrant>());
		let grant = match grant {
			Ok(grant) => grant,
			Err(e) => {
				inner.metrics.record_failure();

				return Err(e);
			},
		};
		let max_seconds = inner.windows.max_token_lifetime.whole_seconds();

		if grant.expires_in > max_seconds {
			obs::report_lifetime_exceeded(grant.expires_in, max_seconds);
		}

		let credential = Credential::new(
			grant.corp_access_token,
			grant.corp_id,
			grant.expires_in,
			inner.clock.now(),
		);

		*inner.cache.lock() = Some(credential.clone());

		inner.metrics.record_success();

		let refresh_in = self.arm_timer(&credential);

		obs::report_cached(credential.ttl_seconds, refresh_in);

		Ok(credential)
	}

	fn arm_timer(&self, credential: &Credential) -> Option<Duration> {
		let inner = &self.inner;

		if !inner.windows.proactive_refresh {
			return None;
		}

		let delay = inner.windows.refresh_delay(credential.ttl());
		let mut slot = inner.timer.lock();

		// Checked under the slot lock so a concurrent shutdown either sees the new timer or
		// prevents it.
		if inner.closed.load(Ordering::SeqCst) {
			return None;
		}

		slot.replace(|generation| {
			spawn_refresh_timer(Arc::downgrade(inner), inner.clock.clone(), delay, generation)
		});

		Some(delay)
	}

	async fn scheduled_refresh(self) {
		const KIND: OpKind = OpKind::ScheduledRefresh;

		if self.is_shut_down() {
			return;
		}

		if let Err(e) = self.observe(KIND, "scheduled_refresh", self.obtain(KIND, true)).await {
			self.inner.metrics.record_background_failure();

			obs::report_background_failure(&e);
		}
	}
}
impl Debug for CredentialManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager")
			.field("windows", &self.inner.windows)
			.field("executor", &self.inner.executor)
			.field("snapshot", &self.current_snapshot())
			.field("closed", &self.is_shut_down())
			.finish()
	}
}

struct Inner {
	identity: Identity,
	windows: RefreshWindows,
	executor: Executor,
	transport: Arc<dyn Transport>,
	clock: Arc<dyn Clock>,
	cache: Mutex<Option<Credential>>,
	timer: Mutex<TimerSlot>,
	flight: AsyncMutex<()>,
	closed: AtomicBool,
	metrics: CredentialMetrics,
}
impl Drop for Inner {
	fn drop(&mut self) {
		self.timer.get_mut().cancel();
	}
}

// Holds only a weak reference so a pending timer never keeps the manager alive.
fn spawn_refresh_timer(
	inner: Weak<Inner>,
	clock: Arc<dyn Clock>,
	delay: Duration,
	generation: u64,
) -> JoinHandle<()> {
	let task: TimerTask = Box::pin(async move {
		clock.sleep(delay).await;

		let Some(inner) = inner.upgrade() else { return };

		inner.timer.lock().release(generation);

		CredentialManager { inner }.scheduled_refresh().await;
	});

	tokio::spawn(task)
}
