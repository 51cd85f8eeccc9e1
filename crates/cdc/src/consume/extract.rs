// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use changefeed_core::{Document, DocumentKey, ID_FIELD};
use serde_json::Value;
use uuid::Uuid;

/// Record identifier carried by an event's document key.
///
/// Missing keys, missing `_id` fields and values that are not UUIDs all map
/// to the nil UUID; the event is still handled.
pub fn extract_id(key: Option<&DocumentKey>) -> Uuid {
	key.and_then(|key| key.get(ID_FIELD)).and_then(parse_uuid).unwrap_or(Uuid::nil())
}

fn parse_uuid(value: &Value) -> Option<Uuid> {
	match value {
		Value::String(text) => Uuid::parse_str(text).ok(),
		// extended JSON: {"$uuid": "..."}
		Value::Object(fields) => fields.get("$uuid").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()),
		_ => None,
	}
}

/// What a reaction reports for an event: the serialized snapshot when there
/// is one, the bare identifier otherwise.
pub fn render_payload(id: Uuid, full_document: Option<&Document>) -> String {
	match full_document {
		Some(document) => serde_json::to_string(document).unwrap_or_else(|_| id.to_string()),
		None => id.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn key(value: Value) -> DocumentKey {
		let mut fields = Document::new();
		fields.insert(ID_FIELD.to_string(), value);
		DocumentKey::new(fields)
	}

	#[test]
	fn test_extract_string_id() {
		let id = Uuid::new_v4();
		assert_eq!(extract_id(Some(&DocumentKey::for_id(id))), id);
	}

	#[test]
	fn test_extract_extended_json_id() {
		let id = Uuid::new_v4();
		assert_eq!(extract_id(Some(&key(json!({ "$uuid": id.to_string() })))), id);
	}

	#[test]
	fn test_malformed_id_falls_back_to_nil() {
		assert_eq!(extract_id(None), Uuid::nil());
		assert_eq!(extract_id(Some(&DocumentKey::default())), Uuid::nil());
		assert_eq!(extract_id(Some(&key(json!("not-a-uuid")))), Uuid::nil());
		assert_eq!(extract_id(Some(&key(json!(42)))), Uuid::nil());
		assert_eq!(extract_id(Some(&key(json!({ "$oid": "abc" })))), Uuid::nil());
	}

	#[test]
	fn test_payload_prefers_document() {
		let id = Uuid::new_v4();
		let mut document = Document::new();
		document.insert("name".to_string(), json!("alpha"));

		assert_eq!(render_payload(id, Some(&document)), r#"{"name":"alpha"}"#);
		assert_eq!(render_payload(id, None), id.to_string());
	}
}
