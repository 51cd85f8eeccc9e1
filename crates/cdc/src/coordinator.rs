// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{future::Future, sync::Arc};

use changefeed_core::{CancellationToken, StorageClient};
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error, info};

use crate::{
	config::FeedConfig,
	consume::{ChangeHandler, FeedSession, SessionReport},
	produce::{GeneratorReport, MutationGenerator},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
	pub session: SessionReport,
	/// `None` if shutdown came before the generator was started.
	pub generator: Option<GeneratorReport>,
}

/// Runs the feed session and the mutation generator side by side.
pub struct Coordinator<C: StorageClient, H: ChangeHandler> {
	client: Arc<C>,
	config: FeedConfig,
	handler: H,
}

impl<C: StorageClient, H: ChangeHandler> Coordinator<C, H> {
	pub fn new(client: Arc<C>, config: FeedConfig, handler: H) -> Self {
		Self {
			client,
			config,
			handler,
		}
	}

	/// Start both loops, wait for `shutdown`, then stop them and wait until
	/// both have stopped.
	///
	/// The feed session starts first. The generator follows after
	/// `generator_delay`, unless shutdown arrives before that. On shutdown the
	/// generator stops first; the session keeps reading for `shutdown_grace`
	/// before it is cancelled too.
	pub async fn run<F>(self, shutdown: F) -> RunReport
	where
		F: Future<Output = ()>,
	{
		let Self {
			client,
			config,
			handler,
		} = self;

		let stop_session = CancellationToken::new();
		let stop_generator = stop_session.child_token();
		info!(namespace = %client.namespace(), "starting change feed");

		let session = FeedSession::new(client.clone(), handler, &config);
		let session_task = tokio::spawn(session.run(stop_session.clone()));

		let generator = MutationGenerator::new(client, config.cycle_interval);
		let mut shutdown = std::pin::pin!(shutdown);

		let generator_task = if config.generator_delay.is_zero() {
			Some(tokio::spawn(generator.run(stop_generator.clone())))
		} else {
			tokio::select! {
				_ = &mut shutdown => {
					info!("termination requested before the generator started");
					stop_generator.cancel();
					None
				}
				_ = sleep(config.generator_delay) => Some(tokio::spawn(generator.run(stop_generator.clone()))),
			}
		};

		if !stop_generator.is_cancelled() {
			shutdown.await;
			info!("termination requested");
			stop_generator.cancel();
		}

		let generator = match generator_task {
			Some(task) => join("mutation generator", task).await,
			None => None,
		};

		if !config.shutdown_grace.is_zero() {
			debug!(grace_ms = config.shutdown_grace.as_millis() as u64, "letting the feed session catch up");
			sleep(config.shutdown_grace).await;
		}
		stop_session.cancel();
		let session = join("feed session", session_task).await.unwrap_or_default();

		info!("change feed stopped");
		RunReport {
			session,
			generator,
		}
	}
}

async fn join<T>(name: &'static str, task: JoinHandle<T>) -> Option<T> {
	match task.await {
		Ok(report) => Some(report),
		Err(e) => {
			error!(task = name, error = %e, "task did not finish cleanly");
			None
		}
	}
}
