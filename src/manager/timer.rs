//! Slot holding the manager's single armed refresh timer.

// crates.io
use tokio::task::JoinHandle;

/// At most one live timer; every re-arm bumps the generation and aborts the previous task.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
	generation: u64,
	handle: Option<JoinHandle<()>>,
}
impl TimerSlot {
	/// Aborts the armed timer, if any.
	pub(crate) fn cancel(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
		}
	}

	/// Cancels the current timer and installs the task built by `spawn` for the next generation.
	pub(crate) fn replace<F>(&mut self, spawn: F)
	where
		F: FnOnce(u64) -> JoinHandle<()>,
	{
		self.cancel();

		self.generation = self.generation.wrapping_add(1);
		self.handle = Some(spawn(self.generation));
	}

	/// Forgets the handle of a timer that already fired so re-arming from inside it cannot
	/// abort the running task. Stale generations are ignored.
	pub(crate) fn release(&mut self, generation: u64) {
		if self.generation == generation {
			self.handle = None;
		}
	}

	/// Returns `true` while a timer task is pending.
	pub(crate) fn is_armed(&self) -> bool {
		self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
	}
}
