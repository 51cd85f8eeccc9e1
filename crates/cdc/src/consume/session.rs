// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Feed session: keeps one subscription open for as long as the feed runs.

use std::sync::Arc;

use changefeed_core::{
	CancellationToken, ChangeStream, Error, FullDocumentMode, ResumeToken, StartPosition, StorageClient, WatchOptions,
	cancellable,
};
use tokio::{sync::watch, time::sleep};
use tracing::{debug, error, info, warn};

use crate::{
	config::FeedConfig,
	consume::{Backoff, ChangeHandler, FeedCheckpoint, consume},
};

/// Observable state of a feed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
	Idle,
	Opening,
	Streaming,
	Terminated,
}

/// The streaming state owns the subscription; leaving it drops the handle.
enum SessionState<S> {
	Idle,
	Opening,
	Streaming(S),
	Terminated,
}

impl<S> SessionState<S> {
	fn phase(&self) -> SessionPhase {
		match self {
			SessionState::Idle => SessionPhase::Idle,
			SessionState::Opening => SessionPhase::Opening,
			SessionState::Streaming(_) => SessionPhase::Streaming,
			SessionState::Terminated => SessionPhase::Terminated,
		}
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
	/// Subscriptions successfully opened.
	pub opens: u64,
	/// Failed opens plus failed or exhausted streams.
	pub failures: u64,
	/// Events handed to the reaction.
	pub events: u64,
	pub last_token: Option<ResumeToken>,
}

pub struct FeedSession<C: StorageClient, H: ChangeHandler> {
	client: Arc<C>,
	handler: H,
	start: StartPosition,
	full_document: FullDocumentMode,
	backoff: Backoff,
	checkpoint: FeedCheckpoint,
	phase: watch::Sender<SessionPhase>,
	report: SessionReport,
}

impl<C: StorageClient, H: ChangeHandler> FeedSession<C, H> {
	pub fn new(client: Arc<C>, handler: H, config: &FeedConfig) -> Self {
		let (phase, _) = watch::channel(SessionPhase::Idle);
		Self {
			client,
			handler,
			start: config.start_position,
			full_document: config.full_document,
			backoff: Backoff::new(config.backoff),
			checkpoint: FeedCheckpoint::new(),
			phase,
			report: SessionReport::default(),
		}
	}

	/// Follow the session's phase transitions.
	pub fn phases(&self) -> watch::Receiver<SessionPhase> {
		self.phase.subscribe()
	}

	/// Options for the next subscription: right after the checkpoint
	/// position if there is one, the configured start position otherwise.
	fn watch_options(&self) -> WatchOptions {
		WatchOptions::new()
			.full_document(self.full_document)
			.start(self.start)
			.resume_after(self.checkpoint.last_token())
	}

	/// Run until `cancel` fires. Never returns an error: failures are logged
	/// and answered by reopening the subscription.
	pub async fn run(mut self, cancel: CancellationToken) -> SessionReport {
		let namespace = self.client.namespace();
		info!(%namespace, "Entering feed session");

		let mut state = SessionState::Idle;
		loop {
			self.enter(&state);
			state = match state {
				SessionState::Idle => SessionState::Opening,
				SessionState::Opening => self.open(&cancel).await,
				SessionState::Streaming(stream) => self.stream(stream, &cancel).await,
				SessionState::Terminated => break,
			};
		}

		info!(%namespace, events = self.report.events, "Exiting feed session");
		self.report
	}

	fn enter(&self, state: &SessionState<C::Stream>) {
		let phase = state.phase();
		debug!(?phase, "feed session transition");
		self.phase.send_replace(phase);
	}

	async fn open(&mut self, cancel: &CancellationToken) -> SessionState<C::Stream> {
		let options = self.watch_options();
		debug!(start = ?options.start, resume_after = ?options.resume_after, "opening change stream");

		match cancellable(cancel, self.client.open_subscription(options)).await {
			Ok(stream) => {
				self.report.opens += 1;
				if let Some(token) = stream.resume_token() {
					self.checkpoint.pin(token);
				}
				info!(opens = self.report.opens, "change stream opened, streaming");
				SessionState::Streaming(stream)
			}
			Err(e) if e.is_cancelled() => {
				info!("feed session was cancelled while opening");
				SessionState::Terminated
			}
			Err(Error::ResumeTokenNotFound(token)) => {
				self.report.failures += 1;
				self.checkpoint.forget();
				error!(
					%token,
					start = ?self.start,
					"resume position left the change log, restarting from the start position"
				);
				self.pause(cancel).await
			}
			Err(e) => {
				self.report.failures += 1;
				error!(error = %e, "failed to open change stream");
				self.pause(cancel).await
			}
		}
	}

	async fn stream(&mut self, mut stream: C::Stream, cancel: &CancellationToken) -> SessionState<C::Stream> {
		let delivered_before = self.checkpoint.delivered();
		let result = consume(&mut stream, &mut self.handler, &mut self.checkpoint, cancel).await;
		stream.close();

		self.report.events = self.checkpoint.delivered();
		self.report.last_token = self.checkpoint.last_token();
		if self.checkpoint.delivered() > delivered_before {
			self.backoff.reset();
		}

		match result {
			Ok(()) => {
				self.report.failures += 1;
				warn!("change stream ended, reopening");
				self.pause(cancel).await
			}
			Err(e) if e.is_cancelled() => {
				info!("feed session was cancelled");
				SessionState::Terminated
			}
			Err(e) => {
				self.report.failures += 1;
				error!(error = %e, "change stream failed, reopening");
				self.pause(cancel).await
			}
		}
	}

	/// Wait out the backoff delay; cancellation cuts the wait short.
	async fn pause(&mut self, cancel: &CancellationToken) -> SessionState<C::Stream> {
		let delay = self.backoff.next_delay();
		debug!(delay_ms = delay.as_millis() as u64, attempt = self.backoff.attempts(), "waiting before reopening");

		tokio::select! {
			biased;

			_ = cancel.cancelled() => {
				info!("feed session was cancelled while waiting to reopen");
				SessionState::Terminated
			}
			_ = sleep(delay) => SessionState::Opening,
		}
	}
}
