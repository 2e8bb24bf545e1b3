//! Fixed-window throttle guarding resource holder updates.
//!
//! A holder may start at most one update per window. Calls arriving inside the window, or while
//! a previous update is still running, are suppressed outright; nothing is queued or merged.

// std
use std::time::{Duration as StdDuration, Instant};
// self
use crate::_prelude::*;

/// Minimum interval between two update executions of one holder.
pub const MIN_TIME_BETWEEN_UPDATES: StdDuration = StdDuration::from_secs(10);

/// Per-holder throttle state.
#[derive(Debug)]
pub struct Throttle {
	interval: StdDuration,
	state: Mutex<ThrottleState>,
}
impl Throttle {
	/// Creates a throttle with a custom window.
	pub fn new(interval: StdDuration) -> Self {
		Self { interval, state: Mutex::new(ThrottleState::default()) }
	}

	/// Returns the configured window.
	pub fn interval(&self) -> StdDuration {
		self.interval
	}

	/// Attempts to start an execution now.
	pub fn try_acquire(&self) -> Option<ThrottlePermit<'_>> {
		self.try_acquire_at(Instant::now())
	}

	/// Attempts to start an execution at `now`.
	///
	/// Returns `None` when an execution is in flight or the previous one started less than one
	/// window before `now`. The returned permit keeps the throttle marked busy until dropped.
	pub fn try_acquire_at(&self, now: Instant) -> Option<ThrottlePermit<'_>> {
		let mut state = self.state.lock();

		if state.in_flight {
			return None;
		}
		if state.last_start.is_some_and(|last| now.saturating_duration_since(last) < self.interval) {
			return None;
		}

		let previous = state.last_start.replace(now);

		state.in_flight = true;

		Some(ThrottlePermit { throttle: self, previous })
	}

	/// Instant the most recent execution started, if any.
	pub fn last_start(&self) -> Option<Instant> {
		self.state.lock().last_start
	}

	/// Returns `true` while a permit is outstanding.
	pub fn is_busy(&self) -> bool {
		self.state.lock().in_flight
	}
}
impl Default for Throttle {
	fn default() -> Self {
		Self::new(MIN_TIME_BETWEEN_UPDATES)
	}
}

#[derive(Debug, Default)]
struct ThrottleState {
	last_start: Option<Instant>,
	in_flight: bool,
}

/// Guard for a running execution; releases the in-flight flag on drop.
#[derive(Debug)]
pub struct ThrottlePermit<'a> {
	throttle: &'a Throttle,
	previous: Option<Instant>,
}
impl ThrottlePermit<'_> {
	/// Gives the window back for an execution that never reached Strava.
	pub fn forfeit(self) {
		self.throttle.state.lock().last_start = self.previous;
	}
}
impl Drop for ThrottlePermit<'_> {
	fn drop(&mut self) {
		self.throttle.state.lock().in_flight = false;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn second_call_inside_window_is_suppressed() {
		let throttle = Throttle::default();
		let start = Instant::now();

		drop(throttle.try_acquire_at(start).expect("First call should run."));

		assert!(throttle.try_acquire_at(start + StdDuration::from_secs(9)).is_none());
		assert!(throttle.try_acquire_at(start + StdDuration::from_secs(10)).is_some());
	}

	#[test]
	fn in_flight_execution_suppresses_later_calls() {
		let throttle = Throttle::new(StdDuration::from_secs(1));
		let start = Instant::now();
		let permit = throttle.try_acquire_at(start).expect("First call should run.");

		assert!(throttle.is_busy());
		assert!(throttle.try_acquire_at(start + StdDuration::from_secs(5)).is_none());

		drop(permit);

		assert!(!throttle.is_busy());
		assert!(throttle.try_acquire_at(start + StdDuration::from_secs(5)).is_some());
	}

	#[test]
	fn suppressed_calls_do_not_extend_the_window() {
		let throttle = Throttle::default();
		let start = Instant::now();

		drop(throttle.try_acquire_at(start).expect("First call should run."));

		assert!(throttle.try_acquire_at(start + StdDuration::from_secs(8)).is_none());
		assert_eq!(throttle.last_start(), Some(start));
		assert!(throttle.try_acquire_at(start + StdDuration::from_secs(11)).is_some());
	}

	#[test]
	fn forfeited_permit_restores_the_previous_window() {
		let throttle = Throttle::default();
		let start = Instant::now();

		drop(throttle.try_acquire_at(start).expect("First call should run."));

		let later = start + StdDuration::from_secs(12);

		throttle.try_acquire_at(later).expect("A call after the window should run.").forfeit();

		assert!(!throttle.is_busy());
		assert_eq!(throttle.last_start(), Some(start));
		assert!(throttle.try_acquire_at(later + StdDuration::from_secs(1)).is_some());
	}
}
