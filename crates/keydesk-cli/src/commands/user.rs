// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use keydesk_engine::NewUser;
use keydesk_model::{BrigadeId, UserId};
use tracing::instrument;

use crate::context::CliContext;
use crate::output::{print_issued, write_bundle};

#[derive(Debug, Subcommand)]
pub enum UserCommands {
	/// Issue credentials for a new user
	Add(AddArgs),
	/// Remove a user and its peer
	Delete(UserRef),
	/// Cut a user off without deleting its record
	Block(UserRef),
	/// Restore a blocked user
	Unblock(UserRef),
	/// Replace every secret of a user and write new configs
	Rotate {
		#[command(flatten)]
		user: UserRef,
		#[arg(long, short, default_value = ".")]
		out: PathBuf,
	},
}

#[derive(Debug, Clone, Args)]
pub struct UserRef {
	pub brigade_id: BrigadeId,
	pub user_id: UserId,
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
	pub brigade_id: BrigadeId,

	/// Display name; a pseudonym is generated when omitted
	#[arg(long)]
	pub name: Option<String>,

	/// Make this user the brigadier
	#[arg(long)]
	pub brigadier: bool,

	/// Directory for the client configs
	#[arg(long, short, default_value = ".")]
	pub out: PathBuf,
}

#[instrument(skip(ctx))]
pub async fn handle(cmd: UserCommands, ctx: &CliContext) -> anyhow::Result<()> {
	let done = |what: &str, user: &UserRef| {
		println!("{} User {} {what}", style("✓").green().bold(), user.user_id);
	};

	match cmd {
		UserCommands::Add(args) => {
			let request = NewUser {
				name: args.name,
				brigadier: args.brigadier,
			};
			let issued = ctx.keydesk.add_user(&args.brigade_id, request).await?;
			let brigade = ctx.keydesk.brigade(&args.brigade_id)?;
			let files = write_bundle(&args.out, &brigade, &issued).await?;
			print_issued(&issued, &files);
		}
		UserCommands::Delete(user) => {
			ctx.keydesk.delete_user(&user.brigade_id, &user.user_id).await?;
			done("deleted", &user);
		}
		UserCommands::Block(user) => {
			ctx.keydesk.block_user(&user.brigade_id, &user.user_id).await?;
			done("blocked", &user);
		}
		UserCommands::Unblock(user) => {
			ctx.keydesk.unblock_user(&user.brigade_id, &user.user_id).await?;
			done("unblocked", &user);
		}
		UserCommands::Rotate { user, out } => {
			let issued = ctx.keydesk.rotate_user(&user.brigade_id, &user.user_id).await?;
			let brigade = ctx.keydesk.brigade(&user.brigade_id)?;
			let files = write_bundle(&out, &brigade, &issued).await?;
			print_issued(&issued, &files);
		}
	}
	Ok(())
}
