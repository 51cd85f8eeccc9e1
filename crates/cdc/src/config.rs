// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use changefeed_core::{FullDocumentMode, Result, StartPosition};
use serde::Deserialize;

/// Configuration for a feed run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
	pub database: String,
	pub collection: String,
	/// Where the first subscription starts. Reopens resume after the last
	/// handled event instead.
	pub start_position: StartPosition,
	pub full_document: FullDocumentMode,
	/// Pause between starting the feed session and the generator
	#[serde(rename = "generator_delay_ms", deserialize_with = "millis")]
	pub generator_delay: Duration,
	/// Pause between two generator cycles
	#[serde(rename = "cycle_interval_ms", deserialize_with = "millis")]
	pub cycle_interval: Duration,
	/// How long the feed session keeps reading after the generator stopped
	#[serde(rename = "shutdown_grace_ms", deserialize_with = "millis")]
	pub shutdown_grace: Duration,
	pub backoff: BackoffConfig,
}

impl Default for FeedConfig {
	fn default() -> Self {
		Self {
			database: "CHANGE_STREAMS".to_string(),
			collection: "items".to_string(),
			start_position: StartPosition::Beginning,
			full_document: FullDocumentMode::UpdateLookup,
			generator_delay: Duration::ZERO,
			cycle_interval: Duration::from_secs(1),
			shutdown_grace: Duration::ZERO,
			backoff: BackoffConfig::default(),
		}
	}
}

impl FeedConfig {
	/// Parse a JSON configuration; missing fields keep their defaults.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	pub fn with_namespace(mut self, database: impl Into<String>, collection: impl Into<String>) -> Self {
		self.database = database.into();
		self.collection = collection.into();
		self
	}

	pub fn with_start_position(mut self, start: StartPosition) -> Self {
		self.start_position = start;
		self
	}

	pub fn with_full_document(mut self, mode: FullDocumentMode) -> Self {
		self.full_document = mode;
		self
	}

	pub fn with_generator_delay(mut self, delay: Duration) -> Self {
		self.generator_delay = delay;
		self
	}

	pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
		self.cycle_interval = interval;
		self
	}

	pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
		self.shutdown_grace = grace;
		self
	}

	pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
		self.backoff = backoff;
		self
	}
}

/// Capped exponential delay between subscription attempts
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
	#[serde(rename = "initial_ms", deserialize_with = "millis")]
	pub initial: Duration,
	#[serde(rename = "max_ms", deserialize_with = "millis")]
	pub max: Duration,
	pub multiplier: u32,
}

impl Default for BackoffConfig {
	fn default() -> Self {
		Self {
			initial: Duration::from_millis(100),
			max: Duration::from_secs(5),
			multiplier: 2,
		}
	}
}

fn millis<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
	u64::deserialize(deserializer).map(Duration::from_millis)
}
