// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::event::{Document, ID_FIELD};

/// The record the generator mutates.
///
/// `id` is fixed when the item is created; `name` is the only field that
/// changes during its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
	#[serde(rename = "_id")]
	pub id: Uuid,
	pub name: String,
}

impl Item {
	pub fn new(id: Uuid, name: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
		}
	}

	/// Fresh identifier and a random initial name.
	pub fn random() -> Self {
		Self::new(Uuid::new_v4(), Uuid::new_v4().to_string())
	}

	/// Replace the name with a new random value, keeping the identifier.
	pub fn rename(&mut self) {
		self.name = Uuid::new_v4().to_string();
	}

	/// Fields written only when the upsert creates the document.
	pub fn set_on_insert(&self) -> Document {
		let mut fields = Document::new();
		fields.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
		fields
	}

	/// Fields written on every upsert.
	pub fn set_fields(&self) -> Document {
		let mut fields = Document::new();
		fields.insert("name".to_string(), Value::String(self.name.clone()));
		fields
	}
}
