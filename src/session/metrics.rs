// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe attempt/success/failure counters for one kind of token operation.
#[derive(Debug, Default)]
pub struct OperationCounters {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl OperationCounters {
	/// Returns the total number of attempts.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful attempts.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed attempts.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}

/// In-process counters kept by a session.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	/// Refresh-token exchanges.
	pub refresh: OperationCounters,
	/// Authorization-code exchanges.
	pub authorize: OperationCounters,
}
