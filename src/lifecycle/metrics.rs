// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for authenticate and refresh attempts.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	authenticate_attempts: AtomicU64,
	authenticate_success: AtomicU64,
	authenticate_failure: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns the total number of authenticate attempts.
	pub fn authenticate_attempts(&self) -> u64 {
		self.authenticate_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful authenticate calls.
	pub fn authenticate_successes(&self) -> u64 {
		self.authenticate_success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed authenticate calls.
	pub fn authenticate_failures(&self) -> u64 {
		self.authenticate_failure.load(Ordering::Relaxed)
	}

	/// Returns the total number of refresh attempts (including staleness-driven ones).
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refresh calls.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh calls.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_authenticate_attempt(&self) {
		self.authenticate_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_authenticate_success(&self) {
		self.authenticate_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_authenticate_failure(&self) {
		self.authenticate_failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}
}
