// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use changefeed_core::{
	ChangeEvent, ChangeStream, DocumentKey, Error, FullDocumentMode, OperationKind, Result, ResumeToken,
};
use tokio::sync::watch;
use tracing::trace;

use crate::collection::{CollectionData, CollectionState};

/// Cursor over a collection's change log.
///
/// Holds its position exclusively; two streams on the same collection never
/// affect each other.
pub struct MemoryChangeStream {
	state: Arc<CollectionState>,
	head: watch::Receiver<u64>,
	full_document: FullDocumentMode,
	next_sequence: u64,
	delivered: u64,
	disconnect_after: Option<u64>,
	invalidated: bool,
	active: Arc<AtomicUsize>,
}

impl MemoryChangeStream {
	pub(crate) fn new(
		state: Arc<CollectionState>,
		full_document: FullDocumentMode,
		next_sequence: u64,
		disconnect_after: Option<u64>,
		active: Arc<AtomicUsize>,
	) -> Self {
		active.fetch_add(1, Ordering::SeqCst);
		let head = state.head.subscribe();
		Self {
			state,
			head,
			full_document,
			next_sequence,
			delivered: 0,
			disconnect_after,
			invalidated: false,
			active,
		}
	}

	fn read_next(&self, data: &CollectionData) -> Option<ChangeEvent> {
		let entry = data.log.get(self.next_sequence)?;

		let full_document = match entry.operation {
			OperationKind::Insert | OperationKind::Replace => entry.document.clone(),
			OperationKind::Update => match self.full_document {
				FullDocumentMode::UpdateLookup => entry.id.and_then(|id| data.documents.get(&id).cloned()),
				FullDocumentMode::Default => None,
			},
			_ => None,
		};

		Some(ChangeEvent {
			operation: entry.operation.clone(),
			namespace: self.state.namespace.clone(),
			document_key: entry.id.map(DocumentKey::for_id),
			full_document,
			updated_fields: entry.updated_fields.clone(),
			resume_token: ResumeToken::new(self.next_sequence),
			cluster_time: entry.cluster_time,
		})
	}
}

#[async_trait]
impl ChangeStream for MemoryChangeStream {
	async fn next(&mut self) -> Result<Option<ChangeEvent>> {
		loop {
			if self.invalidated {
				return Ok(None);
			}
			if self.disconnect_after.is_some_and(|limit| self.delivered >= limit) {
				return Err(Error::stream("connection reset by injected disconnect"));
			}

			// Mark the head as seen before reading, so an append racing with
			// the read still wakes the wait below.
			self.head.borrow_and_update();

			let event = {
				let data = self.state.data.read();
				if self.next_sequence <= data.log.trimmed() {
					return Err(Error::stream(format!(
						"change log trimmed past sequence {}",
						self.next_sequence
					)));
				}
				self.read_next(&data)
			};

			if let Some(event) = event {
				self.next_sequence += 1;
				self.delivered += 1;
				if event.operation == OperationKind::Invalidate {
					self.invalidated = true;
				}
				trace!(token = %event.resume_token, operation = %event.operation, "change stream event");
				return Ok(Some(event));
			}

			if self.head.changed().await.is_err() {
				return Ok(None);
			}
		}
	}

	fn resume_token(&self) -> Option<ResumeToken> {
		Some(ResumeToken::new(self.next_sequence - 1))
	}
}

impl Drop for MemoryChangeStream {
	fn drop(&mut self) {
		self.active.fetch_sub(1, Ordering::SeqCst);
	}
}
