// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::event::ResumeToken;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The shared cancellation token fired while the operation was pending.
	#[error("operation cancelled")]
	Cancelled,

	#[error("storage operation failed: {0}")]
	Storage(String),

	#[error("change stream failed: {0}")]
	Stream(String),

	#[error("resume token {0} is not part of the change log")]
	ResumeTokenNotFound(ResumeToken),

	#[error("field '{field}' is immutable")]
	ImmutableField {
		field: String,
	},

	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
}

impl Error {
	pub fn storage(msg: impl Into<String>) -> Self {
		Error::Storage(msg.into())
	}

	pub fn stream(msg: impl Into<String>) -> Self {
		Error::Stream(msg.into())
	}

	/// Cancellation ends a loop; every other variant is retried or logged.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Error::Cancelled)
	}
}

pub type Result<T> = std::result::Result<T, Error>;
