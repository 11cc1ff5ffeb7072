// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use clap::Subcommand;
use console::style;
use keydesk_model::{BrigadeId, Protocol};
use tracing::instrument;

use crate::context::CliContext;
use crate::output::print_replay;

#[derive(Debug, Subcommand)]
pub enum ProtocolCommands {
	/// Enable a protocol for the brigade and all its users
	Enable { brigade_id: BrigadeId, protocol: Protocol },
	/// Disable a protocol and drop every user's material for it
	Disable { brigade_id: BrigadeId, protocol: Protocol },
	/// Pick a new camouflage domain (ovc, proto0)
	ResetDomain { brigade_id: BrigadeId, protocol: Protocol },
	/// Pick a new listening port (outline, proto0)
	ResetPort { brigade_id: BrigadeId, protocol: Protocol },
}

#[instrument(skip(ctx))]
pub async fn handle(cmd: ProtocolCommands, ctx: &CliContext) -> anyhow::Result<()> {
	let ok = style("✓").green().bold();
	match cmd {
		ProtocolCommands::Enable {
			brigade_id,
			protocol,
		} => {
			let report = ctx.keydesk.enable_protocol(&brigade_id, protocol).await?;
			println!("{ok} {} enabled", style(protocol).cyan());
			println!("  Existing users get their {protocol} configs on rotation.");
			print_replay(&report);
		}
		ProtocolCommands::Disable {
			brigade_id,
			protocol,
		} => {
			let report = ctx.keydesk.disable_protocol(&brigade_id, protocol).await?;
			println!("{ok} {} disabled", style(protocol).cyan());
			print_replay(&report);
		}
		ProtocolCommands::ResetDomain {
			brigade_id,
			protocol,
		} => {
			let (domain, report) = ctx.keydesk.reset_domain(&brigade_id, protocol).await?;
			println!("{ok} {protocol} now impersonates {}", style(domain).cyan());
			print_replay(&report);
		}
		ProtocolCommands::ResetPort {
			brigade_id,
			protocol,
		} => {
			let (port, report) = ctx.keydesk.reset_port(&brigade_id, protocol).await?;
			println!("{ok} {protocol} now listens on {}", style(port).cyan());
			print_replay(&report);
		}
	}
	Ok(())
}
