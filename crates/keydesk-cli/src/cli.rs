// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Command;

/// Keydesk - VPN credential issuance for brigades
#[derive(Parser, Debug)]
#[command(name = "keydesk", version, about, long_about = None)]
pub struct Cli {
	/// Path to configuration file (default: /etc/keydesk/keydesk.toml)
	#[arg(short, long, global = true)]
	pub config: Option<PathBuf>,

	/// Log filter (overrides config; RUST_LOG wins over both)
	#[arg(short, long, global = true)]
	pub log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	pub json_logs: bool,

	#[command(subcommand)]
	pub command: Command,
}
