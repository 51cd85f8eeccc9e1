// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::VecDeque;

use changefeed_core::{Document, OperationKind};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct LogEntry {
	pub operation: OperationKind,
	/// None for collection-level entries such as `invalidate`.
	pub id: Option<Uuid>,
	/// Post image for inserts and replaces.
	pub document: Option<Document>,
	pub updated_fields: Option<Document>,
	pub cluster_time: u64,
}

/// Append-only change log. Sequence numbers start at 1 and have no gaps.
///
/// With a capacity, the oldest entries are trimmed once the log holds more
/// than `capacity` entries. Trimmed sequences are gone for good.
#[derive(Debug, Default)]
pub(crate) struct ChangeLog {
	entries: VecDeque<LogEntry>,
	trimmed: u64,
	capacity: Option<usize>,
}

impl ChangeLog {
	pub fn with_capacity(capacity: Option<usize>) -> Self {
		Self {
			capacity,
			..Self::default()
		}
	}

	/// Returns the sequence number of the new entry.
	pub fn append(&mut self, entry: LogEntry) -> u64 {
		self.entries.push_back(entry);
		if let Some(capacity) = self.capacity {
			while self.entries.len() > capacity.max(1) {
				self.entries.pop_front();
				self.trimmed += 1;
			}
		}
		self.head()
	}

	pub fn get(&self, sequence: u64) -> Option<&LogEntry> {
		let offset = sequence.checked_sub(self.trimmed + 1)?;
		self.entries.get(usize::try_from(offset).ok()?)
	}

	/// Sequence number of the latest entry, 0 when empty.
	pub fn head(&self) -> u64 {
		self.trimmed + self.entries.len() as u64
	}

	/// Last sequence number removed by trimming, 0 if nothing was trimmed.
	///
	/// Reading can continue after any sequence from here up to `head()`.
	pub fn trimmed(&self) -> u64 {
		self.trimmed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(operation: OperationKind) -> LogEntry {
		LogEntry {
			operation,
			id: Some(Uuid::new_v4()),
			document: None,
			updated_fields: None,
			cluster_time: 0,
		}
	}

	#[test]
	fn test_sequences_start_at_one() {
		let mut log = ChangeLog::default();
		assert_eq!(log.head(), 0);
		assert!(log.get(0).is_none());
		assert!(log.get(1).is_none());

		assert_eq!(log.append(entry(OperationKind::Insert)), 1);
		assert_eq!(log.append(entry(OperationKind::Delete)), 2);

		assert_eq!(log.get(1).unwrap().operation, OperationKind::Insert);
		assert_eq!(log.get(2).unwrap().operation, OperationKind::Delete);
		assert!(log.get(3).is_none());
		assert_eq!(log.head(), 2);
		assert_eq!(log.trimmed(), 0);
	}

	#[test]
	fn test_capacity_trims_oldest() {
		let mut log = ChangeLog::with_capacity(Some(2));
		log.append(entry(OperationKind::Insert));
		log.append(entry(OperationKind::Update));
		assert_eq!(log.append(entry(OperationKind::Delete)), 3);

		assert_eq!(log.head(), 3);
		assert_eq!(log.trimmed(), 1);
		assert!(log.get(1).is_none());
		assert_eq!(log.get(2).unwrap().operation, OperationKind::Update);
		assert_eq!(log.get(3).unwrap().operation, OperationKind::Delete);
	}
}
