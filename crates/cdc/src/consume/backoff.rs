// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use crate::config::BackoffConfig;

/// Delay before the next subscription attempt.
///
/// Grows by `multiplier` with every consecutive failure, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
	config: BackoffConfig,
	attempts: u32,
}

impl Backoff {
	pub fn new(config: BackoffConfig) -> Self {
		Self {
			config,
			attempts: 0,
		}
	}

	pub fn next_delay(&mut self) -> Duration {
		let factor = self.config.multiplier.max(1).saturating_pow(self.attempts.min(16));
		self.attempts = self.attempts.saturating_add(1);
		self.config.initial.saturating_mul(factor).min(self.config.max)
	}

	/// Called once a subscription delivered events again.
	pub fn reset(&mut self) {
		self.attempts = 0;
	}

	pub fn attempts(&self) -> u32 {
		self.attempts
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn backoff(initial_ms: u64, max_ms: u64, multiplier: u32) -> Backoff {
		Backoff::new(BackoffConfig {
			initial: Duration::from_millis(initial_ms),
			max: Duration::from_millis(max_ms),
			multiplier,
		})
	}

	#[test]
	fn test_grows_and_caps() {
		let mut backoff = backoff(100, 500, 2);
		let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
		assert_eq!(delays, vec![100, 200, 400, 500, 500]);
		assert_eq!(backoff.attempts(), 5);
	}

	#[test]
	fn test_reset_starts_over() {
		let mut backoff = backoff(10, 1000, 3);
		backoff.next_delay();
		backoff.next_delay();
		backoff.reset();
		assert_eq!(backoff.next_delay(), Duration::from_millis(10));
	}

	#[test]
	fn test_no_overflow_after_many_failures() {
		let mut backoff = backoff(100, 5000, 10);
		for _ in 0..100 {
			assert!(backoff.next_delay() <= Duration::from_millis(5000));
		}
	}

	#[test]
	fn test_zero_multiplier_is_constant() {
		let mut backoff = backoff(50, 1000, 0);
		assert_eq!(backoff.next_delay(), Duration::from_millis(50));
		assert_eq!(backoff.next_delay(), Duration::from_millis(50));
	}
}
