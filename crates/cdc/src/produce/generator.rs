// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{future::Future, sync::Arc, time::Duration};

use changefeed_core::{CancellationToken, Item, Result, StorageClient, cancellable};
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of one insert/update/delete cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
	pub inserted: bool,
	pub updated: bool,
	pub deleted: bool,
}

impl CycleReport {
	pub fn is_complete(&self) -> bool {
		self.inserted && self.updated && self.deleted
	}

	pub fn failed_steps(&self) -> u64 {
		[self.inserted, self.updated, self.deleted].iter().filter(|done| !**done).count() as u64
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorReport {
	/// Cycles that ran all three steps, successfully or not.
	pub cycles: u64,
	/// Cycles in which every step succeeded.
	pub complete_cycles: u64,
	pub failed_steps: u64,
}

/// Creates, renames and deletes one fresh record per cycle.
pub struct MutationGenerator<C: StorageClient> {
	client: Arc<C>,
	interval: Duration,
}

impl<C: StorageClient> MutationGenerator<C> {
	pub fn new(client: Arc<C>, interval: Duration) -> Self {
		Self {
			client,
			interval,
		}
	}

	/// Run cycles until `cancel` fires.
	pub async fn run(self, cancel: CancellationToken) -> GeneratorReport {
		info!(namespace = %self.client.namespace(), "Entering mutation generator");
		let mut report = GeneratorReport::default();

		loop {
			match self.run_cycle(&cancel).await {
				Ok(cycle) => {
					report.cycles += 1;
					report.failed_steps += cycle.failed_steps();
					if cycle.is_complete() {
						report.complete_cycles += 1;
					}
				}
				Err(_) => {
					info!("mutation generator was cancelled");
					break;
				}
			}

			if cancellable(&cancel, async {
				sleep(self.interval).await;
				Ok(())
			})
			.await
			.is_err()
			{
				info!("mutation generator was cancelled");
				break;
			}
		}

		info!(cycles = report.cycles, "Exiting mutation generator");
		report
	}

	/// Insert a fresh item, rename it, delete it.
	///
	/// A failed step is logged and the cycle moves on to the next step. The
	/// only error returned is `Error::Cancelled`.
	pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
		let mut item = Item::random();
		let mut cycle = CycleReport::default();

		let upsert = self.client.upsert(item.id, item.set_on_insert(), item.set_fields());
		if self.step(cancel, "insert", item.id, upsert).await?.is_some() {
			cycle.inserted = true;
			info!(id = %item.id, "Inserted item: {}", describe(&item));
		}

		item.rename();
		let upsert = self.client.upsert(item.id, item.set_on_insert(), item.set_fields());
		if self.step(cancel, "update", item.id, upsert).await?.is_some() {
			cycle.updated = true;
			info!(id = %item.id, "Updated item: {}", describe(&item));
		}

		match self.step(cancel, "delete", item.id, self.client.delete(item.id)).await? {
			Some(true) => {
				cycle.deleted = true;
				info!(id = %item.id, "Deleted item: {}", item.id);
			}
			Some(false) => warn!(id = %item.id, "delete found no item"),
			None => {}
		}

		Ok(cycle)
	}

	/// `Ok(None)` for a logged failure, `Err` only for cancellation.
	async fn step<T>(
		&self,
		cancel: &CancellationToken,
		step: &'static str,
		id: Uuid,
		operation: impl Future<Output = Result<T>>,
	) -> Result<Option<T>> {
		match cancellable(cancel, operation).await {
			Ok(value) => Ok(Some(value)),
			Err(e) if e.is_cancelled() => Err(e),
			Err(e) => {
				error!(step, %id, error = %e, "mutation failed");
				Ok(None)
			}
		}
	}
}

fn describe(item: &Item) -> String {
	serde_json::to_string(item).unwrap_or_else(|_| item.id.to_string())
}
