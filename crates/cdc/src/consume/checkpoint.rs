// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use changefeed_core::ResumeToken;

/// Progress of a feed session across all of its subscriptions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedCheckpoint {
	last_token: Option<ResumeToken>,
	delivered: u64,
}

impl FeedCheckpoint {
	pub fn new() -> Self {
		Self::default()
	}

	/// Position the next subscription resumes after: the last event whose
	/// reaction returned, or where the first subscription started.
	pub fn last_token(&self) -> Option<ResumeToken> {
		self.last_token
	}

	/// Number of events handed to the reaction so far.
	pub fn delivered(&self) -> u64 {
		self.delivered
	}

	pub(crate) fn advance(&mut self, token: ResumeToken) {
		self.last_token = Some(token);
		self.delivered += 1;
	}

	/// Keep the starting position of a subscription that has not delivered
	/// anything yet. No-op once a position is known.
	pub(crate) fn pin(&mut self, token: ResumeToken) {
		if self.last_token.is_none() {
			self.last_token = Some(token);
		}
	}

	/// Drop a position the engine no longer knows.
	pub(crate) fn forget(&mut self) {
		self.last_token = None;
	}
}
