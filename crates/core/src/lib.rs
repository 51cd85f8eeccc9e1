// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared types for the change feed demonstrator.
//!
//! This crate contains the pieces both sides of the feed agree on:
//! - The mutated record and the change events describing its lifecycle
//! - The storage client seam (`StorageClient` / `ChangeStream`)
//! - The error taxonomy, with cancellation kept apart from real failures
//! - A helper that races any storage call against the shared cancellation token

pub mod cancel;
pub mod client;
pub mod error;
pub mod event;
pub mod record;

pub use cancel::cancellable;
pub use client::{ChangeStream, FullDocumentMode, StartPosition, StorageClient, UpsertOutcome, WatchOptions};
pub use error::{Error, Result};
pub use event::{ChangeEvent, Document, DocumentKey, ID_FIELD, OperationKind, ResumeToken};
pub use record::Item;
pub use tokio_util::sync::CancellationToken;
