// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Record store location.

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_STORAGE_DIR: &str = "/var/lib/keydesk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
	/// Parent of the per-brigade directories.
	pub dir: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			dir: PathBuf::from(DEFAULT_STORAGE_DIR),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfigLayer {
	#[serde(default)]
	pub dir: Option<PathBuf>,
}

impl StorageConfigLayer {
	pub fn merge(&mut self, other: StorageConfigLayer) {
		if other.dir.is_some() {
			self.dir = other.dir;
		}
	}

	pub fn finalize(self) -> StorageConfig {
		StorageConfig {
			dir: self
				.dir
				.unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
		}
	}
}
