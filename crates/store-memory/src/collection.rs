// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashMap,
	sync::{Arc, atomic::Ordering},
};

use async_trait::async_trait;
use changefeed_core::{
	Document, Error, ID_FIELD, OperationKind, Result, StartPosition, StorageClient, UpsertOutcome, WatchOptions,
};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::trace;
use uuid::Uuid;

use crate::{
	StoreInner,
	log::{ChangeLog, LogEntry},
	stream::MemoryChangeStream,
};

pub(crate) struct CollectionState {
	pub namespace: String,
	pub data: RwLock<CollectionData>,
	/// Sequence number of the latest log entry.
	pub head: watch::Sender<u64>,
}

#[derive(Default)]
pub(crate) struct CollectionData {
	pub documents: HashMap<Uuid, Document>,
	pub log: ChangeLog,
}

impl CollectionState {
	pub fn new(namespace: String, log_capacity: Option<usize>) -> Self {
		let (head, _) = watch::channel(0);
		Self {
			namespace,
			data: RwLock::new(CollectionData {
				documents: HashMap::new(),
				log: ChangeLog::with_capacity(log_capacity),
			}),
			head,
		}
	}

	fn publish(&self, log: &mut ChangeLog, entry: LogEntry) {
		let sequence = log.append(entry);
		self.head.send_replace(sequence);
	}
}

/// Storage client bound to one collection of a `MemoryStore`.
#[derive(Clone)]
pub struct MemoryCollection {
	store: Arc<StoreInner>,
	state: Arc<CollectionState>,
}

impl MemoryCollection {
	pub(crate) fn new(store: Arc<StoreInner>, state: Arc<CollectionState>) -> Self {
		Self {
			store,
			state,
		}
	}

	pub fn find(&self, id: Uuid) -> Option<Document> {
		self.state.data.read().documents.get(&id).cloned()
	}

	pub fn len(&self) -> usize {
		self.state.data.read().documents.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of entries ever appended to the change log, trimmed ones
	/// included.
	pub fn log_len(&self) -> u64 {
		self.state.data.read().log.head()
	}

	/// Swap the whole document, keeping its identifier. Returns `false` if
	/// there is no document with `id`.
	pub fn replace(&self, id: Uuid, document: Document) -> Result<bool> {
		self.begin_write()?;
		check_id_untouched(id, &document)?;

		let mut guard = self.state.data.write();
		let CollectionData {
			documents,
			log,
		} = &mut *guard;

		let Some(current) = documents.get_mut(&id) else {
			return Ok(false);
		};

		let mut replacement = id_document(id);
		for (field, value) in document {
			if field != ID_FIELD {
				replacement.insert(field, value);
			}
		}
		*current = replacement.clone();

		let cluster_time = self.store.tick();
		self.state.publish(
			log,
			LogEntry {
				operation: OperationKind::Replace,
				id: Some(id),
				document: Some(replacement),
				updated_fields: None,
				cluster_time,
			},
		);
		trace!(namespace = %self.state.namespace, %id, "replaced document");
		Ok(true)
	}

	/// Remove every document and invalidate open streams.
	pub fn drop_collection(&self) {
		let mut guard = self.state.data.write();
		let CollectionData {
			documents,
			log,
		} = &mut *guard;

		documents.clear();
		let cluster_time = self.store.tick();
		self.state.publish(
			log,
			LogEntry {
				operation: OperationKind::Invalidate,
				id: None,
				document: None,
				updated_fields: None,
				cluster_time,
			},
		);
		trace!(namespace = %self.state.namespace, "dropped collection");
	}

	fn begin_write(&self) -> Result<()> {
		self.store.writes.fetch_add(1, Ordering::SeqCst);
		if self.store.faults.take_write_failure() {
			return Err(Error::storage("injected write failure"));
		}
		Ok(())
	}
}

#[async_trait]
impl StorageClient for MemoryCollection {
	type Stream = MemoryChangeStream;

	fn namespace(&self) -> String {
		self.state.namespace.clone()
	}

	async fn upsert(&self, id: Uuid, set_on_insert: Document, set: Document) -> Result<UpsertOutcome> {
		self.begin_write()?;
		if set.contains_key(ID_FIELD) {
			return Err(Error::ImmutableField {
				field: ID_FIELD.to_string(),
			});
		}

		let mut guard = self.state.data.write();
		let CollectionData {
			documents,
			log,
		} = &mut *guard;

		let entry = match documents.get_mut(&id) {
			Some(document) => {
				let mut changed = Document::new();
				for (field, value) in set {
					if document.get(&field) != Some(&value) {
						document.insert(field.clone(), value.clone());
						changed.insert(field, value);
					}
				}
				if changed.is_empty() {
					return Ok(UpsertOutcome::Unchanged);
				}

				LogEntry {
					operation: OperationKind::Update,
					id: Some(id),
					document: None,
					updated_fields: Some(changed),
					cluster_time: self.store.tick(),
				}
			}
			None => {
				let mut document = id_document(id);
				for (field, value) in set_on_insert {
					if field != ID_FIELD {
						document.insert(field, value);
					}
				}
				document.extend(set);
				documents.insert(id, document.clone());

				LogEntry {
					operation: OperationKind::Insert,
					id: Some(id),
					document: Some(document),
					updated_fields: None,
					cluster_time: self.store.tick(),
				}
			}
		};

		let outcome = match entry.operation {
			OperationKind::Insert => UpsertOutcome::Inserted,
			_ => UpsertOutcome::Updated,
		};
		self.state.publish(log, entry);
		trace!(namespace = %self.state.namespace, %id, ?outcome, "upserted document");
		Ok(outcome)
	}

	async fn delete(&self, id: Uuid) -> Result<bool> {
		self.begin_write()?;

		let mut guard = self.state.data.write();
		let CollectionData {
			documents,
			log,
		} = &mut *guard;

		if documents.remove(&id).is_none() {
			return Ok(false);
		}

		let cluster_time = self.store.tick();
		self.state.publish(
			log,
			LogEntry {
				operation: OperationKind::Delete,
				id: Some(id),
				document: None,
				updated_fields: None,
				cluster_time,
			},
		);
		trace!(namespace = %self.state.namespace, %id, "deleted document");
		Ok(true)
	}

	async fn open_subscription(&self, options: WatchOptions) -> Result<MemoryChangeStream> {
		self.store.opens.fetch_add(1, Ordering::SeqCst);
		if self.store.faults.take_open_failure() {
			return Err(Error::storage("injected subscription open failure"));
		}

		let (trimmed, head) = {
			let data = self.state.data.read();
			(data.log.trimmed(), data.log.head())
		};
		let next_sequence = match options.resume_after {
			Some(token) if token.sequence() < trimmed || token.sequence() > head => {
				return Err(Error::ResumeTokenNotFound(token));
			}
			Some(token) => token.sequence() + 1,
			None => match options.start {
				StartPosition::Beginning => trimmed + 1,
				StartPosition::Now => head + 1,
			},
		};

		trace!(namespace = %self.state.namespace, next_sequence, "opened change stream");
		Ok(MemoryChangeStream::new(
			self.state.clone(),
			options.full_document,
			next_sequence,
			self.store.faults.take_disconnect(),
			self.store.active_streams.clone(),
		))
	}
}

fn id_document(id: Uuid) -> Document {
	let mut document = Document::new();
	document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
	document
}

fn check_id_untouched(id: Uuid, document: &Document) -> Result<()> {
	match document.get(ID_FIELD) {
		Some(Value::String(value)) if *value == id.to_string() => Ok(()),
		None => Ok(()),
		Some(_) => Err(Error::ImmutableField {
			field: ID_FIELD.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::MemoryStore;

	fn fields(value: Value) -> Document {
		match value {
			Value::Object(map) => map,
			_ => panic!("expected an object"),
		}
	}

	#[tokio::test]
	async fn test_upsert_inserts_then_updates() {
		let items = MemoryStore::new().collection("db", "items");
		let id = Uuid::new_v4();

		let first = items.upsert(id, id_document(id), fields(json!({"name": "a"}))).await.unwrap();
		assert_eq!(first, UpsertOutcome::Inserted);

		let second = items.upsert(id, id_document(id), fields(json!({"name": "b"}))).await.unwrap();
		assert_eq!(second, UpsertOutcome::Updated);

		let stored = items.find(id).unwrap();
		assert_eq!(stored.get("name"), Some(&json!("b")));
		assert_eq!(stored.get(ID_FIELD), Some(&json!(id.to_string())));
		assert_eq!(items.log_len(), 2);
	}

	#[tokio::test]
	async fn test_set_on_insert_ignored_for_existing_document() {
		let items = MemoryStore::new().collection("db", "items");
		let id = Uuid::new_v4();

		items.upsert(id, fields(json!({"origin": "first"})), fields(json!({"name": "a"}))).await.unwrap();
		items.upsert(id, fields(json!({"origin": "second"})), fields(json!({"name": "b"}))).await.unwrap();

		let stored = items.find(id).unwrap();
		assert_eq!(stored.get("origin"), Some(&json!("first")));
	}

	#[tokio::test]
	async fn test_unchanged_upsert_appends_nothing() {
		let items = MemoryStore::new().collection("db", "items");
		let id = Uuid::new_v4();

		items.upsert(id, id_document(id), fields(json!({"name": "a"}))).await.unwrap();
		let outcome = items.upsert(id, id_document(id), fields(json!({"name": "a"}))).await.unwrap();

		assert_eq!(outcome, UpsertOutcome::Unchanged);
		assert_eq!(items.log_len(), 1);
	}

	#[tokio::test]
	async fn test_set_cannot_touch_id() {
		let items = MemoryStore::new().collection("db", "items");
		let id = Uuid::new_v4();

		let result = items.upsert(id, Document::new(), fields(json!({"_id": "other"}))).await;
		assert!(matches!(result, Err(Error::ImmutableField { .. })));
		assert!(items.is_empty());
	}

	#[tokio::test]
	async fn test_delete_missing_document() {
		let items = MemoryStore::new().collection("db", "items");
		assert!(!items.delete(Uuid::new_v4()).await.unwrap());
		assert_eq!(items.log_len(), 0);
	}

	#[tokio::test]
	async fn test_replace_keeps_id() {
		let items = MemoryStore::new().collection("db", "items");
		let id = Uuid::new_v4();
		items.upsert(id, id_document(id), fields(json!({"name": "a", "extra": 1}))).await.unwrap();

		assert!(items.replace(id, fields(json!({"name": "z"}))).unwrap());

		let stored = items.find(id).unwrap();
		assert_eq!(stored.get("name"), Some(&json!("z")));
		assert_eq!(stored.get("extra"), None);
		assert_eq!(stored.get(ID_FIELD), Some(&json!(id.to_string())));

		let foreign = fields(json!({"_id": Uuid::new_v4().to_string()}));
		assert!(matches!(items.replace(id, foreign), Err(Error::ImmutableField { .. })));
		assert!(!items.replace(Uuid::new_v4(), Document::new()).unwrap());
	}

	#[tokio::test]
	async fn test_injected_write_failure_leaves_data_untouched() {
		let store = MemoryStore::new();
		let items = store.collection("db", "items");
		store.faults().fail_next_writes(1);

		let id = Uuid::new_v4();
		let result = items.upsert(id, id_document(id), fields(json!({"name": "a"}))).await;
		assert!(matches!(result, Err(Error::Storage(_))));
		assert!(items.is_empty());
		assert_eq!(store.write_count(), 1);

		items.upsert(id, id_document(id), fields(json!({"name": "a"}))).await.unwrap();
		assert_eq!(items.len(), 1);
		assert_eq!(store.write_count(), 2);
	}

	#[tokio::test]
	async fn test_collections_are_shared_by_namespace() {
		let store = MemoryStore::new();
		let a = store.collection("db", "items");
		let b = store.collection("db", "items");
		let other = store.collection("db", "other");

		let id = Uuid::new_v4();
		a.upsert(id, id_document(id), Document::new()).await.unwrap();

		assert!(b.find(id).is_some());
		assert!(other.find(id).is_none());
		assert_eq!(a.namespace(), "db.items");
	}
}
