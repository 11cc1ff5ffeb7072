// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Custodian public keys every secret is sealed to.

use std::path::PathBuf;

use keydesk_seal::{SealPublicKey, Sealer};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysConfig {
	pub router: SealPublicKey,
	pub shuffler: SealPublicKey,
}

impl KeysConfig {
	pub fn sealer(&self) -> Sealer {
		Sealer::new(self.router, self.shuffler)
	}
}

/// Each key is given inline as base64 or as a path to a file holding it.
/// The inline value wins when both are set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysConfigLayer {
	#[serde(default)]
	pub router_public_key: Option<String>,
	#[serde(default)]
	pub router_public_key_file: Option<PathBuf>,
	#[serde(default)]
	pub shuffler_public_key: Option<String>,
	#[serde(default)]
	pub shuffler_public_key_file: Option<PathBuf>,
}

impl KeysConfigLayer {
	pub fn merge(&mut self, other: KeysConfigLayer) {
		if other.router_public_key.is_some() {
			self.router_public_key = other.router_public_key;
		}
		if other.router_public_key_file.is_some() {
			self.router_public_key_file = other.router_public_key_file;
		}
		if other.shuffler_public_key.is_some() {
			self.shuffler_public_key = other.shuffler_public_key;
		}
		if other.shuffler_public_key_file.is_some() {
			self.shuffler_public_key_file = other.shuffler_public_key_file;
		}
	}

	pub fn finalize(self) -> Result<KeysConfig, ConfigError> {
		let router = resolve(
			"keys.router_public_key",
			self.router_public_key,
			self.router_public_key_file,
		)?;
		let shuffler = resolve(
			"keys.shuffler_public_key",
			self.shuffler_public_key,
			self.shuffler_public_key_file,
		)?;
		if router == shuffler {
			return Err(ConfigError::Validation(
				"router and shuffler public keys must differ".to_string(),
			));
		}
		Ok(KeysConfig { router, shuffler })
	}
}

fn resolve(
	key: &str,
	inline: Option<String>,
	file: Option<PathBuf>,
) -> Result<SealPublicKey, ConfigError> {
	let encoded = match (inline, file) {
		(Some(value), _) => value,
		(None, Some(path)) => {
			std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead { path, source })?
		}
		(None, None) => return Err(ConfigError::Missing(key.to_string())),
	};
	SealPublicKey::from_base64(encoded.trim()).map_err(|e| ConfigError::InvalidValue {
		key: key.to_string(),
		message: e.to_string(),
	})
}
