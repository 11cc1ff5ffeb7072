// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Writing client configuration files and printing results.

use std::path::{Path, PathBuf};

use console::style;
use keydesk_engine::{IssuedUser, ReplayReport};
use keydesk_model::Brigade;
use keydesk_protocols::amnezia;
use tokio::fs;
use tracing::{info, instrument};

/// Write every client config of `issued`, plus the Amnezia import file, into
/// `dir`. Files are created owner-readable only.
#[instrument(skip(brigade, issued), fields(user_id = %issued.user_id))]
pub async fn write_bundle(dir: &Path, brigade: &Brigade, issued: &IssuedUser) -> anyhow::Result<Vec<PathBuf>> {
	fs::create_dir_all(dir).await?;

	let mut files = issued.bundle.files()?;
	let amnezia_name = files
		.first()
		.map(|f| f.name.trim_end_matches(".conf").to_string())
		.unwrap_or_else(|| issued.user_id.to_string());
	files.push(keydesk_protocols::BundleFile {
		name: format!("{amnezia_name}-amnezia.json"),
		contents: amnezia(brigade, &issued.bundle)?,
	});

	let mut written = Vec::with_capacity(files.len());
	for file in files {
		let path = dir.join(&file.name);
		write_private(&path, file.contents.expose()).await?;
		written.push(path);
	}
	info!(files = written.len(), "client configs written");
	Ok(written)
}

async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	#[cfg(unix)]
	{
		use tokio::fs::OpenOptions;
		use tokio::io::AsyncWriteExt;

		let mut file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.mode(0o600)
			.open(path)
			.await?;
		file.write_all(contents).await?;
		file.flush().await?;
	}

	#[cfg(not(unix))]
	{
		fs::write(path, contents).await?;
	}

	Ok(())
}

pub fn print_issued(issued: &IssuedUser, files: &[PathBuf]) {
	println!("{} {}", style("✓").green().bold(), style(&issued.name).bold());
	println!("  Brigade: {}", style(issued.brigade_id).cyan());
	println!("  User:    {}", style(issued.user_id).cyan());
	for path in files {
		println!("  {}", path.display());
	}
}

pub fn print_replay(report: &ReplayReport) {
	println!(
		"{} Replayed {} peers ({} blocked skipped)",
		style("✓").green().bold(),
		report.peers_restored,
		report.blocked_skipped
	);
}
