// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{path::PathBuf, time::Duration};

use changefeed_cdc::FeedConfig;
use changefeed_core::{FullDocumentMode, StartPosition};
use clap::{Parser, ValueEnum};

/// Watch a collection while a generator inserts, renames and deletes items in it
#[derive(Parser, Debug)]
#[command(name = "changefeed-demo")]
#[command(version)]
pub struct Cli {
	/// JSON file holding a feed configuration; flags override its values
	#[arg(short = 'c', long = "config")]
	pub config: Option<PathBuf>,

	#[arg(long = "database")]
	pub database: Option<String>,

	#[arg(long = "collection")]
	pub collection: Option<String>,

	/// Where the first subscription starts
	#[arg(long = "start")]
	pub start: Option<Start>,

	/// Whether update events carry the current document
	#[arg(long = "full-document")]
	pub full_document: Option<FullDocument>,

	/// Pause before the generator starts, in milliseconds
	#[arg(long = "generator-delay-ms")]
	pub generator_delay_ms: Option<u64>,

	/// Pause between generator cycles, in milliseconds
	#[arg(long = "cycle-interval-ms")]
	pub cycle_interval_ms: Option<u64>,

	/// How long the feed keeps reading after the generator stopped, in milliseconds
	#[arg(long = "shutdown-grace-ms")]
	pub shutdown_grace_ms: Option<u64>,

	/// Change log entries kept per collection; 0 keeps everything
	#[arg(long = "log-capacity", default_value_t = 10_000)]
	pub log_capacity: usize,

	#[arg(long = "backoff-initial-ms")]
	pub backoff_initial_ms: Option<u64>,

	#[arg(long = "backoff-max-ms")]
	pub backoff_max_ms: Option<u64>,

	/// Filter directive used when RUST_LOG is not set
	#[arg(long = "log-level", default_value = "info")]
	pub log_level: String,

	#[arg(long = "log-format", default_value = "pretty")]
	pub log_format: LogFormat,

	/// What ends the run
	#[arg(long = "terminate-on", default_value = "ctrl-c")]
	pub terminate_on: Terminate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Start {
	Beginning,
	Now,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FullDocument {
	Default,
	UpdateLookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
	Pretty,
	Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Terminate {
	CtrlC,
	Enter,
}

impl Cli {
	/// Apply the flags that were given on top of `config`.
	pub fn apply(&self, mut config: FeedConfig) -> FeedConfig {
		if let Some(database) = &self.database {
			config.database = database.clone();
		}
		if let Some(collection) = &self.collection {
			config.collection = collection.clone();
		}
		if let Some(start) = self.start {
			config.start_position = match start {
				Start::Beginning => StartPosition::Beginning,
				Start::Now => StartPosition::Now,
			};
		}
		if let Some(mode) = self.full_document {
			config.full_document = match mode {
				FullDocument::Default => FullDocumentMode::Default,
				FullDocument::UpdateLookup => FullDocumentMode::UpdateLookup,
			};
		}
		if let Some(ms) = self.generator_delay_ms {
			config.generator_delay = Duration::from_millis(ms);
		}
		if let Some(ms) = self.cycle_interval_ms {
			config.cycle_interval = Duration::from_millis(ms);
		}
		if let Some(ms) = self.shutdown_grace_ms {
			config.shutdown_grace = Duration::from_millis(ms);
		}
		if let Some(ms) = self.backoff_initial_ms {
			config.backoff.initial = Duration::from_millis(ms);
		}
		if let Some(ms) = self.backoff_max_ms {
			config.backoff.max = Duration::from_millis(ms);
		}
		config
	}
}
