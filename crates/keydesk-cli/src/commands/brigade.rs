// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use ipnet::{Ipv4Net, Ipv6Net};
use keydesk_engine::NewBrigade;
use keydesk_model::{BrigadeId, Protocol};
use tracing::instrument;

use crate::context::CliContext;
use crate::output::{print_issued, write_bundle};

#[derive(Debug, Subcommand)]
pub enum BrigadeCommands {
	/// Create a brigade with its brigadier
	Create(CreateArgs),
	/// Remove a brigade from the gateway and from disk
	Destroy {
		brigade_id: BrigadeId,
	},
	/// List stored brigades
	List,
	/// Show a brigade's users
	Show {
		brigade_id: BrigadeId,
		/// Print JSON instead of a table
		#[arg(long)]
		json: bool,
	},
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
	/// Brigade id; generated when omitted
	#[arg(long)]
	pub id: Option<BrigadeId>,

	#[arg(long)]
	pub endpoint_ipv4: Ipv4Addr,

	/// Host name clients connect to instead of the address
	#[arg(long)]
	pub endpoint_domain: Option<String>,

	#[arg(long, default_value_t = 51820)]
	pub endpoint_port: u16,

	#[arg(long)]
	pub dns_v4: Ipv4Addr,

	#[arg(long)]
	pub dns_v6: Ipv6Addr,

	/// Private IPv4 network users are numbered from
	#[arg(long)]
	pub cgnat: Ipv4Net,

	/// Private IPv6 network users are numbered from
	#[arg(long)]
	pub ula: Ipv6Net,

	#[arg(long)]
	pub keydesk_ipv6: Ipv6Addr,

	/// Protocol to enable besides WireGuard (repeatable)
	#[arg(long = "protocol", short = 'p')]
	pub protocols: Vec<Protocol>,

	#[arg(long)]
	pub brigadier_name: Option<String>,

	#[arg(long)]
	pub vip: bool,

	/// Directory for the brigadier's client configs
	#[arg(long, short, default_value = ".")]
	pub out: PathBuf,
}

impl CreateArgs {
	pub fn into_request(self) -> (NewBrigade, PathBuf) {
		let request = NewBrigade {
			brigade_id: self.id.unwrap_or_default(),
			endpoint_ipv4: self.endpoint_ipv4,
			endpoint_domain: self.endpoint_domain,
			endpoint_port: self.endpoint_port,
			dns_v4: self.dns_v4,
			dns_v6: self.dns_v6,
			ipv4_cgnat: self.cgnat,
			ipv6_ula: self.ula,
			keydesk_ipv6: self.keydesk_ipv6,
			protocols: self.protocols,
			brigadier_name: self.brigadier_name,
			vip: self.vip,
		};
		(request, self.out)
	}
}

#[instrument(skip(ctx))]
pub async fn handle(cmd: BrigadeCommands, ctx: &CliContext) -> anyhow::Result<()> {
	match cmd {
		BrigadeCommands::Create(args) => {
			let (request, out) = args.into_request();
			let issued = ctx.keydesk.create_brigade(request).await?;
			let brigade = ctx.keydesk.brigade(&issued.brigade_id)?;
			let files = write_bundle(&out, &brigade, &issued).await?;
			print_issued(&issued, &files);
		}
		BrigadeCommands::Destroy { brigade_id } => {
			ctx.keydesk.destroy_brigade(&brigade_id).await?;
			println!("{} Brigade {} destroyed", style("✓").green().bold(), brigade_id);
		}
		BrigadeCommands::List => {
			let ids = ctx.keydesk.list_brigades()?;
			if ids.is_empty() {
				println!("{} No brigades", style("!").yellow().bold());
			}
			for id in ids {
				println!("{id}");
			}
		}
		BrigadeCommands::Show { brigade_id, json } => {
			let users = ctx.keydesk.list_users(&brigade_id)?;
			if json {
				println!("{}", serde_json::to_string_pretty(&users)?);
				return Ok(());
			}
			println!("{:<38} {:<28} {:<16} {:<8}", "ID", "NAME", "IPV4", "STATE");
			for user in users {
				let state = if user.is_brigadier {
					style("brigadier").cyan()
				} else if user.is_blocked {
					style("blocked").red()
				} else {
					style("active").green()
				};
				println!(
					"{:<38} {:<28} {:<16} {}",
					user.user_id,
					user.name,
					user.ipv4_addr.to_string(),
					state
				);
			}
		}
	}
	Ok(())
}
