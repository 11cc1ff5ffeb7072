// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod brigade;
pub mod maintenance;
pub mod protocol;
pub mod user;

use clap::Subcommand;

use crate::context::CliContext;

pub use brigade::{BrigadeCommands, CreateArgs};
pub use maintenance::{PatchArgs, ReplayArgs, VisitArgs};
pub use protocol::ProtocolCommands;
pub use user::UserCommands;

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create, destroy and inspect brigades
	#[command(subcommand)]
	Brigade(BrigadeCommands),
	/// Manage users of a brigade
	#[command(subcommand)]
	User(UserCommands),
	/// Switch protocols and reroll their camouflage
	#[command(subcommand)]
	Protocol(ProtocolCommands),
	/// Push a stored brigade to the gateway again
	Replay(ReplayArgs),
	/// Bring a stored brigade in line with a fresh record
	Patch(PatchArgs),
	/// Record a brigadier visit to the keydesk
	Visit(VisitArgs),
}

pub async fn run(command: Command, ctx: &CliContext) -> anyhow::Result<()> {
	match command {
		Command::Brigade(cmd) => brigade::handle(cmd, ctx).await,
		Command::User(cmd) => user::handle(cmd, ctx).await,
		Command::Protocol(cmd) => protocol::handle(cmd, ctx).await,
		Command::Replay(args) => maintenance::handle_replay(args, ctx).await,
		Command::Patch(args) => maintenance::handle_patch(args, ctx).await,
		Command::Visit(args) => maintenance::handle_visit(args, ctx),
	}
}
