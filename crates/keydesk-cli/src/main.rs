// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use console::style;
use keydesk_cli::{commands, exit_code, Cli, CliContext, EXIT_OK};
use keydesk_config::{load_config, load_config_with_file, load_logging, LogFormat, LoggingConfig};
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&logging.level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let config = match &cli.config {
		Some(path) => load_config_with_file(path),
		None => load_config(),
	}
	.context("failed to load configuration")?;
	debug!(storage = %config.storage.dir.display(), gateway = %config.gateway.url, "configuration loaded");

	let ctx = CliContext::from_config(&config)?;
	commands::run(cli.command, &ctx).await
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	let mut logging = load_logging(cli.config.clone());
	if let Some(level) = &cli.log_level {
		logging.level = level.clone();
	}
	if cli.json_logs {
		logging.format = LogFormat::Json;
	}
	init_tracing(&logging);

	match run(cli).await {
		Ok(()) => ExitCode::from(EXIT_OK),
		Err(err) => {
			let code = exit_code(&err);
			error!(error = %err, code, "command failed");
			eprintln!("{} {err:#}", style("error:").red().bold());
			ExitCode::from(code)
		}
	}
}
