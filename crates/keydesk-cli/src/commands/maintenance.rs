// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Replay, patch and visit: operations that keep the gateway and the stored
//! record in step.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use keydesk_engine::{PatchOutcome, ReplayOptions};
use keydesk_model::{Brigade, BrigadeId};
use tracing::instrument;

use crate::context::CliContext;
use crate::exit::FullReplayRequired;
use crate::output::print_replay;

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
	pub brigade_id: BrigadeId,

	/// Delete the interface on the gateway before recreating it
	#[arg(long)]
	pub delete_interface: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PatchArgs {
	/// JSON file holding the fresh brigade record
	pub file: PathBuf,

	/// Replace the stored record and replay even when brigade-level fields
	/// changed
	#[arg(long)]
	pub force: bool,
}

#[derive(Debug, Clone, Args)]
pub struct VisitArgs {
	pub brigade_id: BrigadeId,

	/// Visit time (RFC 3339); now when omitted
	#[arg(long)]
	pub at: Option<DateTime<Utc>>,
}

#[instrument(skip(ctx))]
pub async fn handle_replay(args: ReplayArgs, ctx: &CliContext) -> anyhow::Result<()> {
	let options = ReplayOptions {
		delete_interface: args.delete_interface,
	};
	let report = ctx.keydesk.replay_brigade(&args.brigade_id, options).await?;
	print_replay(&report);
	Ok(())
}

#[instrument(skip(ctx))]
pub async fn handle_patch(args: PatchArgs, ctx: &CliContext) -> anyhow::Result<()> {
	let fresh = read_record(&args.file).await?;

	match ctx.keydesk.patch(&fresh, args.force).await? {
		PatchOutcome::Applied(summary) if summary.is_empty() => {
			println!("{} Nothing to patch", style("✓").green().bold());
		}
		PatchOutcome::Applied(summary) => {
			println!(
				"{} Patched: {} created, {} deleted, {} replayed, {} blocked",
				style("✓").green().bold(),
				summary.created,
				summary.deleted,
				summary.replayed,
				summary.blocked
			);
		}
		PatchOutcome::Replaced(report) => {
			println!("{} Brigade replaced", style("✓").green().bold());
			print_replay(&report);
		}
		PatchOutcome::FullReplayRequired { changed } => {
			return Err(FullReplayRequired { changed }.into());
		}
	}
	Ok(())
}

pub fn handle_visit(args: VisitArgs, ctx: &CliContext) -> anyhow::Result<()> {
	let at = args.at.unwrap_or_else(Utc::now);
	ctx.keydesk.record_visit(&args.brigade_id, at)?;
	println!("{} Visit recorded at {}", style("✓").green().bold(), at.to_rfc3339());
	Ok(())
}

async fn read_record(path: &PathBuf) -> anyhow::Result<Brigade> {
	let bytes = tokio::fs::read(path)
		.await
		.with_context(|| format!("failed to read {}", path.display()))?;
	serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}
