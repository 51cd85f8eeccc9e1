// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change feed consumption
//!
//! This module provides the consumer side of the feed:
//! - The reaction callback invoked once per event
//! - Event interpretation (identifier extraction, payload rendering)
//! - Checkpointing of the last handled resume token
//! - The feed session that reopens the subscription after failures

mod backoff;
mod checkpoint;
mod consumer;
mod extract;
mod session;

pub use backoff::Backoff;
pub use checkpoint::FeedCheckpoint;
pub use consumer::{ChangeHandler, LogReaction, consume};
pub use extract::{extract_id, render_payload};
pub use session::{FeedSession, SessionPhase, SessionReport};
