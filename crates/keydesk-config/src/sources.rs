// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::env::{env_list, env_parse, env_var};
use crate::error::ConfigError;
use crate::layer::KeydeskConfigLayer;
use crate::sections::{
	DomainsConfigLayer, GatewayConfigLayer, KeysConfigLayer, LimitsConfigLayer, LogFormat,
	LoggingConfigLayer, StorageConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/keydesk/keydesk.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<KeydeskConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<KeydeskConfigLayer, ConfigError> {
		Ok(KeydeskConfigLayer::default())
	}
}

pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file the operator named explicitly; it must exist.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	/// The system-wide file, skipped when absent.
	pub fn system() -> Self {
		Self {
			path: PathBuf::from(SYSTEM_CONFIG_PATH),
			required: false,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<KeydeskConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(KeydeskConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: KeydeskConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `KEYDESK_<SECTION>_<FIELD>`. The gateway token is not part of
/// the layer; it is read separately at finalization.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<KeydeskConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(KeydeskConfigLayer {
			storage: Some(StorageConfigLayer {
				dir: env_var("KEYDESK_STORAGE_DIR").map(PathBuf::from),
			}),
			keys: Some(KeysConfigLayer {
				router_public_key: env_var("KEYDESK_ROUTER_PUBLIC_KEY"),
				router_public_key_file: env_var("KEYDESK_ROUTER_PUBLIC_KEY_FILE").map(PathBuf::from),
				shuffler_public_key: env_var("KEYDESK_SHUFFLER_PUBLIC_KEY"),
				shuffler_public_key_file: env_var("KEYDESK_SHUFFLER_PUBLIC_KEY_FILE")
					.map(PathBuf::from),
			}),
			gateway: Some(GatewayConfigLayer {
				url: env_var("KEYDESK_GATEWAY_URL"),
				timeout_secs: env_parse("KEYDESK_GATEWAY_TIMEOUT_SECS")?,
			}),
			limits: Some(LimitsConfigLayer {
				max_users: env_parse("KEYDESK_MAX_USERS")?,
			}),
			domains: Some(DomainsConfigLayer {
				fake_domains: env_list("KEYDESK_FAKE_DOMAINS"),
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("KEYDESK_LOG_LEVEL"),
				format: env_parse::<LogFormat>("KEYDESK_LOG_FORMAT")?,
			}),
		})
	}
}
