// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Storage client seam.
//!
//! The generator writes through `StorageClient`, the feed session reads
//! through the `ChangeStream` it opens. Both are scoped to one collection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	Result,
	event::{ChangeEvent, Document, ResumeToken},
};

/// Whether update events carry the document snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullDocumentMode {
	/// Only inserts and replaces carry a snapshot.
	Default,
	/// Updates look the document up when the event is read. The snapshot is
	/// absent if the document no longer exists by then.
	#[default]
	UpdateLookup,
}

/// Where a new subscription starts when no resume token is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
	/// Replay the whole change log (operation time zero).
	#[default]
	Beginning,
	/// Only events applied after the subscription opened.
	Now,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
	pub full_document: FullDocumentMode,
	pub start: StartPosition,
	/// Takes precedence over `start`.
	pub resume_after: Option<ResumeToken>,
}

impl WatchOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn full_document(mut self, mode: FullDocumentMode) -> Self {
		self.full_document = mode;
		self
	}

	pub fn start(mut self, start: StartPosition) -> Self {
		self.start = start;
		self
	}

	pub fn resume_after(mut self, token: Option<ResumeToken>) -> Self {
		self.resume_after = token;
		self
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
	Inserted,
	Updated,
	/// The document existed and the set fields already held these values.
	Unchanged,
}

#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
	type Stream: ChangeStream;

	/// `database.collection` this client is bound to.
	fn namespace(&self) -> String;

	/// Insert the document if `id` is unknown, otherwise update it.
	///
	/// `set_on_insert` is applied only when the document is created, so the
	/// identifier can never be overwritten by a later call. `set` is applied
	/// either way.
	async fn upsert(&self, id: Uuid, set_on_insert: Document, set: Document) -> Result<UpsertOutcome>;

	/// Returns `false` if there was nothing to delete.
	async fn delete(&self, id: Uuid) -> Result<bool>;

	async fn open_subscription(&self, options: WatchOptions) -> Result<Self::Stream>;
}

#[async_trait]
pub trait ChangeStream: Send + 'static {
	/// Wait for the next event. `Ok(None)` means the stream is exhausted.
	async fn next(&mut self) -> Result<Option<ChangeEvent>>;

	/// Position the stream has read up to: the last delivered event, or where
	/// the subscription started if nothing was delivered yet. `None` if the
	/// engine does not expose one.
	fn resume_token(&self) -> Option<ResumeToken>;

	/// Release the subscription. Dropping the stream has the same effect.
	fn close(self)
	where
		Self: Sized,
	{
		drop(self)
	}
}
