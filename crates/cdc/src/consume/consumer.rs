// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use changefeed_core::{CancellationToken, ChangeStream, Document, OperationKind, Result, cancellable};
use tracing::info;
use uuid::Uuid;

use crate::consume::{FeedCheckpoint, extract_id, render_payload};

/// Reaction invoked once per change event, in feed order.
///
/// The next event is not fetched until `on_event` returns.
pub trait ChangeHandler: Send + 'static {
	fn on_event(&mut self, operation: &OperationKind, id: Uuid, full_document: Option<&Document>);
}

impl<F> ChangeHandler for F
where
	F: FnMut(&OperationKind, Uuid, Option<&Document>) + Send + 'static,
{
	fn on_event(&mut self, operation: &OperationKind, id: Uuid, full_document: Option<&Document>) {
		self(operation, id, full_document)
	}
}

/// Reports every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReaction;

impl ChangeHandler for LogReaction {
	fn on_event(&mut self, operation: &OperationKind, id: Uuid, full_document: Option<&Document>) {
		let payload = render_payload(id, full_document);
		info!(
			%operation,
			%id,
			snapshot = full_document.is_some(),
			"Received item {}: {}",
			operation,
			payload
		);
	}
}

/// Feed events from `stream` to `handler` until the stream ends.
///
/// Returns `Ok(())` once the stream is exhausted and `Error::Cancelled` when
/// `cancel` fires, including while waiting for the next event. Stream errors
/// are returned as they are; retrying is up to the caller.
pub async fn consume<S, H>(
	stream: &mut S,
	handler: &mut H,
	checkpoint: &mut FeedCheckpoint,
	cancel: &CancellationToken,
) -> Result<()>
where
	S: ChangeStream,
	H: ChangeHandler + ?Sized,
{
	loop {
		let Some(event) = cancellable(cancel, stream.next()).await? else {
			return Ok(());
		};

		let id = extract_id(event.document_key.as_ref());
		handler.on_event(&event.operation, id, event.full_document.as_ref());
		checkpoint.advance(event.resume_token);
	}
}

#[cfg(test)]
mod tests {
	use std::{collections::VecDeque, time::Duration};

	use async_trait::async_trait;
	use changefeed_core::{ChangeEvent, DocumentKey, Error, ResumeToken};
	use changefeed_testing::Recorder;

	use super::*;

	enum Step {
		Event(ChangeEvent),
		Fail,
		Hang,
	}

	struct ScriptedStream {
		steps: VecDeque<Step>,
	}

	#[async_trait]
	impl ChangeStream for ScriptedStream {
		async fn next(&mut self) -> Result<Option<ChangeEvent>> {
			match self.steps.pop_front() {
				Some(Step::Event(event)) => Ok(Some(event)),
				Some(Step::Fail) => Err(Error::stream("reset")),
				Some(Step::Hang) => {
					tokio::time::sleep(Duration::from_secs(3600)).await;
					Ok(None)
				}
				None => Ok(None),
			}
		}

		fn resume_token(&self) -> Option<ResumeToken> {
			None
		}
	}

	fn event(sequence: u64, operation: OperationKind, id: Uuid, document: Option<Document>) -> Step {
		Step::Event(ChangeEvent {
			operation,
			namespace: "db.items".to_string(),
			document_key: Some(DocumentKey::for_id(id)),
			full_document: document,
			updated_fields: None,
			resume_token: ResumeToken::new(sequence),
			cluster_time: sequence,
		})
	}

	#[tokio::test]
	async fn test_consume_until_exhausted() {
		let id = Uuid::new_v4();
		let mut stream = ScriptedStream {
			steps: VecDeque::from([
				event(1, OperationKind::Insert, id, Some(Document::new())),
				event(2, OperationKind::Update, id, None),
				event(3, OperationKind::Delete, id, None),
			]),
		};
		let recorder = Recorder::new();
		let mut handler = recorder.handler();
		let mut checkpoint = FeedCheckpoint::new();

		consume(&mut stream, &mut handler, &mut checkpoint, &CancellationToken::new()).await.unwrap();

		assert_eq!(
			recorder.operations_for(id),
			vec![OperationKind::Insert, OperationKind::Update, OperationKind::Delete]
		);
		assert_eq!(checkpoint.last_token(), Some(ResumeToken::new(3)));
		assert_eq!(checkpoint.delivered(), 3);
	}

	#[tokio::test]
	async fn test_error_propagates_after_handled_events() {
		let id = Uuid::new_v4();
		let mut stream = ScriptedStream {
			steps: VecDeque::from([event(1, OperationKind::Insert, id, None), Step::Fail]),
		};
		let recorder = Recorder::new();
		let mut handler = recorder.handler();
		let mut checkpoint = FeedCheckpoint::new();

		let result = consume(&mut stream, &mut handler, &mut checkpoint, &CancellationToken::new()).await;

		assert!(matches!(result, Err(Error::Stream(_))));
		assert_eq!(recorder.len(), 1);
		assert_eq!(checkpoint.last_token(), Some(ResumeToken::new(1)));
	}

	#[tokio::test]
	async fn test_cancel_interrupts_pending_next() {
		let mut stream = ScriptedStream {
			steps: VecDeque::from([Step::Hang]),
		};
		let cancel = CancellationToken::new();
		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			trigger.cancel();
		});

		let mut handler = LogReaction;
		let mut checkpoint = FeedCheckpoint::new();
		let result = tokio::time::timeout(
			Duration::from_secs(5),
			consume(&mut stream, &mut handler, &mut checkpoint, &cancel),
		)
		.await
		.expect("consume should return promptly");

		assert!(result.unwrap_err().is_cancelled());
	}

	#[tokio::test]
	async fn test_missing_key_yields_nil_id() {
		let mut stream = ScriptedStream {
			steps: VecDeque::from([Step::Event(ChangeEvent {
				operation: OperationKind::Invalidate,
				namespace: "db.items".to_string(),
				document_key: None,
				full_document: None,
				updated_fields: None,
				resume_token: ResumeToken::new(1),
				cluster_time: 1,
			})]),
		};
		let recorder = Recorder::new();
		let mut handler = recorder.handler();

		consume(&mut stream, &mut handler, &mut FeedCheckpoint::new(), &CancellationToken::new()).await.unwrap();

		assert_eq!(recorder.snapshot()[0].id, Uuid::nil());
		assert_eq!(recorder.snapshot()[0].operation, OperationKind::Invalidate);
	}
}
