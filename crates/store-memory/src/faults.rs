// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

/// Injected failures, consumed as they trigger.
#[derive(Debug, Default)]
pub struct Faults {
	failing_opens: AtomicU32,
	failing_writes: AtomicU32,
	disconnect_after: Mutex<Option<u64>>,
}

impl Faults {
	/// The next `count` subscription opens fail.
	pub fn fail_next_opens(&self, count: u32) {
		self.failing_opens.store(count, Ordering::SeqCst);
	}

	/// The next `count` writes fail without touching any document.
	pub fn fail_next_writes(&self, count: u32) {
		self.failing_writes.store(count, Ordering::SeqCst);
	}

	/// The next stream to open fails with a disconnect once it has delivered
	/// `events` events.
	pub fn disconnect_next_stream_after(&self, events: u64) {
		*self.disconnect_after.lock() = Some(events);
	}

	pub(crate) fn take_open_failure(&self) -> bool {
		take_one(&self.failing_opens)
	}

	pub(crate) fn take_write_failure(&self) -> bool {
		take_one(&self.failing_writes)
	}

	pub(crate) fn take_disconnect(&self) -> Option<u64> {
		self.disconnect_after.lock().take()
	}
}

fn take_one(counter: &AtomicU32) -> bool {
	counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_failures_are_consumed() {
		let faults = Faults::default();
		assert!(!faults.take_open_failure());

		faults.fail_next_opens(2);
		assert!(faults.take_open_failure());
		assert!(faults.take_open_failure());
		assert!(!faults.take_open_failure());
	}

	#[test]
	fn test_disconnect_applies_once() {
		let faults = Faults::default();
		faults.disconnect_next_stream_after(3);
		assert_eq!(faults.take_disconnect(), Some(3));
		assert_eq!(faults.take_disconnect(), None);
	}

	#[test]
	fn test_write_failures_independent_of_opens() {
		let faults = Faults::default();
		faults.fail_next_writes(1);
		assert!(!faults.take_open_failure());
		assert!(faults.take_write_failure());
		assert!(!faults.take_write_failure());
	}
}
