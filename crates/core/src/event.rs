// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change events as they come out of the feed.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// A stored document: field name to value.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
	Insert,
	Update,
	Replace,
	Delete,
	/// The feed itself became unusable (e.g. the collection was dropped).
	Invalidate,
	Other(String),
}

impl OperationKind {
	pub fn as_str(&self) -> &str {
		match self {
			OperationKind::Insert => "insert",
			OperationKind::Update => "update",
			OperationKind::Replace => "replace",
			OperationKind::Delete => "delete",
			OperationKind::Invalidate => "invalidate",
			OperationKind::Other(name) => name,
		}
	}
}

impl From<&str> for OperationKind {
	fn from(value: &str) -> Self {
		match value {
			"insert" => OperationKind::Insert,
			"update" => OperationKind::Update,
			"replace" => OperationKind::Replace,
			"delete" => OperationKind::Delete,
			"invalidate" => OperationKind::Invalidate,
			other => OperationKind::Other(other.to_string()),
		}
	}
}

impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for OperationKind {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for OperationKind {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let name = String::deserialize(deserializer)?;
		Ok(OperationKind::from(name.as_str()))
	}
}

/// Opaque position of an event in the feed.
///
/// Tokens are strictly increasing in feed order. Handing one back to
/// `WatchOptions::resume_after` continues the feed right after that event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResumeToken(u64);

impl ResumeToken {
	pub fn new(sequence: u64) -> Self {
		Self(sequence)
	}

	pub fn sequence(&self) -> u64 {
		self.0
	}
}

impl Display for ResumeToken {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// The key fields identifying the document an event touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(Document);

impl DocumentKey {
	pub fn new(fields: Document) -> Self {
		Self(fields)
	}

	pub fn for_id(id: Uuid) -> Self {
		let mut fields = Document::new();
		fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
		Self(fields)
	}

	pub fn get(&self, field: &str) -> Option<&Value> {
		self.0.get(field)
	}

	pub fn fields(&self) -> &Document {
		&self.0
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
	pub operation: OperationKind,
	/// `database.collection` the event belongs to.
	pub namespace: String,
	/// Absent only for feed-level control events such as `invalidate`.
	pub document_key: Option<DocumentKey>,
	/// Snapshot of the document. Never present for deletes.
	pub full_document: Option<Document>,
	/// Fields changed by an update.
	pub updated_fields: Option<Document>,
	pub resume_token: ResumeToken,
	/// Logical time at which the engine applied the mutation.
	pub cluster_time: u64,
}
