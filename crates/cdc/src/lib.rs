// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change feed consumption and production.
//!
//! - `consume`: turns a change stream into reactions and keeps a live
//!   subscription open across failures
//! - `produce`: the mutation generator feeding the stream
//! - `coordinator`: runs both against one storage client until shutdown

pub mod config;
pub mod consume;
pub mod coordinator;
pub mod produce;

pub use config::{BackoffConfig, FeedConfig};
pub use consume::{
	ChangeHandler, FeedCheckpoint, FeedSession, LogReaction, SessionPhase, SessionReport, consume, extract_id,
	render_payload,
};
pub use coordinator::{Coordinator, RunReport};
pub use produce::{CycleReport, GeneratorReport, MutationGenerator};
