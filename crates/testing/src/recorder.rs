// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Captures every reaction a feed consumer makes.

use std::sync::Arc;

use changefeed_core::{Document, OperationKind};
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
	pub operation: OperationKind,
	pub id: Uuid,
	pub full_document: Option<Document>,
}

#[derive(Clone, Default)]
pub struct Recorder {
	observed: Arc<Mutex<Vec<Observed>>>,
}

impl Recorder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reaction callback appending to this recorder.
	pub fn handler(&self) -> impl FnMut(&OperationKind, Uuid, Option<&Document>) + Send + 'static {
		let observed = self.observed.clone();
		move |operation, id, full_document| {
			observed.lock().push(Observed {
				operation: operation.clone(),
				id,
				full_document: full_document.cloned(),
			});
		}
	}

	pub fn len(&self) -> usize {
		self.observed.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn snapshot(&self) -> Vec<Observed> {
		self.observed.lock().clone()
	}

	pub fn count(&self, operation: &OperationKind) -> usize {
		self.observed.lock().iter().filter(|o| &o.operation == operation).count()
	}

	/// Operations seen for one record, in arrival order.
	pub fn operations_for(&self, id: Uuid) -> Vec<OperationKind> {
		self.observed.lock().iter().filter(|o| o.id == id).map(|o| o.operation.clone()).collect()
	}
}
