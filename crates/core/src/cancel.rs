// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Run `operation` unless `cancel` fires first.
///
/// A pending operation is dropped as soon as the token is cancelled and the
/// call fails with `Error::Cancelled`. An already cancelled token never
/// starts the operation.
pub async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	if cancel.is_cancelled() {
		return Err(Error::Cancelled);
	}

	tokio::select! {
		biased;

		_ = cancel.cancelled() => Err(Error::Cancelled),
		result = operation => result,
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::{
			Arc,
			atomic::{AtomicBool, Ordering},
		},
		time::Duration,
	};

	use super::*;

	#[tokio::test]
	async fn test_completes_without_cancellation() {
		let cancel = CancellationToken::new();
		let result = cancellable(&cancel, async { Ok(7) }).await;
		assert_eq!(result.unwrap(), 7);
	}

	#[tokio::test]
	async fn test_interrupts_pending_wait() {
		let cancel = CancellationToken::new();
		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(20)).await;
			trigger.cancel();
		});

		let result: Result<()> = cancellable(&cancel, async {
			tokio::time::sleep(Duration::from_secs(60)).await;
			Ok(())
		})
		.await;

		assert!(result.unwrap_err().is_cancelled());
	}

	#[tokio::test]
	async fn test_already_cancelled_never_starts() {
		let cancel = CancellationToken::new();
		cancel.cancel();

		let started = Arc::new(AtomicBool::new(false));
		let flag = started.clone();
		let result: Result<()> = cancellable(&cancel, async move {
			flag.store(true, Ordering::SeqCst);
			Ok(())
		})
		.await;

		assert!(result.unwrap_err().is_cancelled());
		assert!(!started.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn test_propagates_operation_error() {
		let cancel = CancellationToken::new();
		let result: Result<()> = cancellable(&cancel, async { Err(Error::storage("nope")) }).await;
		assert!(matches!(result, Err(Error::Storage(_))));
	}
}
