// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod args;

use std::{error::Error, fs, sync::Arc};

use args::{Cli, LogFormat, Terminate};
use changefeed_cdc::{Coordinator, FeedConfig, LogReaction};
use changefeed_store_memory::MemoryStore;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(cli: &Cli) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
	let _ = match cli.log_format {
		LogFormat::Json => builder.json().try_init(),
		LogFormat::Pretty => builder.try_init(),
	};
}

fn load_config(cli: &Cli) -> Result<FeedConfig, Box<dyn Error>> {
	let config = match &cli.config {
		Some(path) => FeedConfig::from_json(&fs::read_to_string(path)?)?,
		None => FeedConfig::default(),
	};
	Ok(cli.apply(config))
}

async fn terminate(on: Terminate) {
	match on {
		Terminate::CtrlC => {
			if let Err(e) = tokio::signal::ctrl_c().await {
				error!(error = %e, "failed to listen for ctrl-c");
			}
		}
		Terminate::Enter => {
			let mut line = String::new();
			if let Err(e) = BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
				error!(error = %e, "failed to read from stdin");
			}
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	init_logging(&cli);
	let config = load_config(&cli)?;

	let store = match cli.log_capacity {
		0 => MemoryStore::new(),
		capacity => MemoryStore::with_log_capacity(capacity),
	};
	let items = Arc::new(store.collection(&config.database, &config.collection));

	match cli.terminate_on {
		Terminate::CtrlC => println!("Press <CTRL+C> to terminate..."),
		Terminate::Enter => println!("Press <ENTER> to terminate..."),
	}

	let report = Coordinator::new(items, config, LogReaction).run(terminate(cli.terminate_on)).await;

	info!(
		events = report.session.events,
		opens = report.session.opens,
		failures = report.session.failures,
		cycles = report.generator.map(|g| g.cycles).unwrap_or(0),
		"change feed demo finished"
	);
	Ok(())
}
