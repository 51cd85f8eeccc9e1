// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-process document store with a change log.
//!
//! Every collection keeps its documents and an ordered log of the mutations
//! applied to them. Change streams read that log from a start position and
//! wait for new entries. Fault injection lets tests break opens, writes and
//! live streams on demand.
//!
//! The log is unbounded unless the store is built with
//! `MemoryStore::with_log_capacity`.

mod collection;
mod faults;
mod log;
mod stream;

use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicU64, AtomicUsize, Ordering},
	},
};

pub use collection::MemoryCollection;
pub use faults::Faults;
use parking_lot::RwLock;
pub use stream::MemoryChangeStream;

use crate::collection::CollectionState;

#[derive(Clone, Default)]
pub struct MemoryStore {
	inner: Arc<StoreInner>,
}

#[derive(Default)]
pub(crate) struct StoreInner {
	collections: RwLock<HashMap<String, Arc<CollectionState>>>,
	pub(crate) clock: AtomicU64,
	pub(crate) faults: Faults,
	pub(crate) opens: AtomicU64,
	pub(crate) writes: AtomicU64,
	pub(crate) active_streams: Arc<AtomicUsize>,
	log_capacity: Option<usize>,
}

impl StoreInner {
	pub(crate) fn tick(&self) -> u64 {
		self.clock.fetch_add(1, Ordering::SeqCst) + 1
	}
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store whose collections keep at most `capacity` change log entries.
	/// Subscriptions that fall behind the trimmed part can no longer resume.
	pub fn with_log_capacity(capacity: usize) -> Self {
		Self {
			inner: Arc::new(StoreInner {
				log_capacity: Some(capacity),
				..StoreInner::default()
			}),
		}
	}

	/// Client bound to `database.name`, created on first use.
	pub fn collection(&self, database: &str, name: &str) -> MemoryCollection {
		let namespace = format!("{database}.{name}");

		if let Some(state) = self.inner.collections.read().get(&namespace) {
			return MemoryCollection::new(self.inner.clone(), state.clone());
		}

		let state = self
			.inner
			.collections
			.write()
			.entry(namespace.clone())
			.or_insert_with(|| Arc::new(CollectionState::new(namespace, self.inner.log_capacity)))
			.clone();
		MemoryCollection::new(self.inner.clone(), state)
	}

	pub fn faults(&self) -> &Faults {
		&self.inner.faults
	}

	/// Subscription open attempts, successful or not.
	pub fn open_count(&self) -> u64 {
		self.inner.opens.load(Ordering::SeqCst)
	}

	/// Write attempts (upsert, replace, delete), successful or not.
	pub fn write_count(&self) -> u64 {
		self.inner.writes.load(Ordering::SeqCst)
	}

	/// Change streams currently held open.
	pub fn active_subscriptions(&self) -> usize {
		self.inner.active_streams.load(Ordering::SeqCst)
	}
}
