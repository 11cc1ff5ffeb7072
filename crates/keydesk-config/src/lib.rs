// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for keydesk.
//!
//! Sources, lowest to highest precedence: built-in defaults, a TOML file
//! (`/etc/keydesk/keydesk.toml` or an explicit path), and `KEYDESK_*`
//! environment variables. The gateway token only comes from
//! `KEYDESK_GATEWAY_TOKEN` or `KEYDESK_GATEWAY_TOKEN_FILE`.
//!
//! ```ignore
//! let config = keydesk_config::load_config()?;
//! let sealer = config.keys.sealer();
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::KeydeskConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH};

use std::path::PathBuf;

use tracing::{debug, info};

pub const GATEWAY_TOKEN_ENV: &str = "KEYDESK_GATEWAY_TOKEN";

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct KeydeskConfig {
	pub storage: StorageConfig,
	pub keys: KeysConfig,
	pub gateway: GatewayConfig,
	pub limits: LimitsConfig,
	pub domains: DomainsConfig,
	pub logging: LoggingConfig,
}

/// Load from defaults, the system file and the environment.
pub fn load_config() -> Result<KeydeskConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load with an explicit config file in place of the system one.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<KeydeskConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<KeydeskConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = KeydeskConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let token = load_secret_env(GATEWAY_TOKEN_ENV)?;
	finalize(merged, token)
}

/// Only the logging section, for initializing the subscriber before the rest
/// of the configuration is known to be valid.
pub fn load_logging(config_path: Option<PathBuf>) -> LoggingConfig {
	let file = match config_path {
		Some(path) => TomlSource::new(path),
		None => TomlSource::system(),
	};
	let mut merged = KeydeskConfigLayer::default();
	for layer in [file.load(), EnvSource.load()].into_iter().flatten() {
		merged.merge(layer);
	}
	merged.logging.unwrap_or_default().finalize()
}

/// Finalize a merged layer into the resolved configuration.
pub fn finalize(
	layer: KeydeskConfigLayer,
	gateway_token: Option<keydesk_seal::Plaintext>,
) -> Result<KeydeskConfig, ConfigError> {
	let storage = layer.storage.unwrap_or_default().finalize();
	let keys = layer.keys.unwrap_or_default().finalize()?;
	let gateway = layer.gateway.unwrap_or_default().finalize(gateway_token)?;
	let limits = layer.limits.unwrap_or_default().finalize()?;
	let domains = layer.domains.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		storage_dir = %storage.dir.display(),
		router_key = ?keys.router,
		shuffler_key = ?keys.shuffler,
		gateway_url = %gateway.url,
		gateway_token = gateway.token.is_some(),
		max_users = limits.max_users,
		fake_domains = domains.fake_domains.len(),
		"keydesk configuration loaded"
	);

	Ok(KeydeskConfig {
		storage,
		keys,
		gateway,
		limits,
		domains,
		logging,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_seal::SealKeyPair;
	use std::io::Write;
	use tempfile::NamedTempFile;

	fn config_file(extra: &str) -> NamedTempFile {
		let router = SealKeyPair::generate().public_key();
		let shuffler = SealKeyPair::generate().public_key();
		let mut file = NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[keys]
router_public_key = "{}"
shuffler_public_key = "{}"

[gateway]
url = "http://127.0.0.1:9000/api"
{extra}
"#,
			router.to_base64(),
			shuffler.to_base64(),
		)
		.unwrap();
		file
	}

	#[test]
	fn file_only_config_resolves_with_defaults() {
		let file = config_file("");
		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.storage, StorageConfig::default());
		assert_eq!(config.limits.max_users, DEFAULT_MAX_USERS);
		assert_eq!(config.gateway.url, "http://127.0.0.1:9000/api");
		assert!(config.domains.fake_domains.is_empty());
		assert_ne!(config.keys.router, config.keys.shuffler);
	}

	#[test]
	fn file_sections_override_defaults() {
		let file = config_file(
			r#"
timeout_secs = 5

[limits]
max_users = 12
"#,
		);
		let config = load_from_sources(vec![
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();
		assert_eq!(config.limits.max_users, 12);
		assert_eq!(config.gateway.timeout.as_secs(), 5);
	}

	#[test]
	fn missing_keys_fail_finalization() {
		let mut layer = KeydeskConfigLayer::default();
		layer.gateway = Some(GatewayConfigLayer {
			url: Some("http://gw".to_string()),
			timeout_secs: None,
		});
		assert!(matches!(
			finalize(layer, None),
			Err(ConfigError::Missing(_))
		));
	}

	#[test]
	fn sealer_uses_both_keys() {
		let file = config_file("");
		let config = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap();
		let sealer = config.keys.sealer();
		assert_eq!(sealer.router_key(), &config.keys.router);
		assert_eq!(sealer.shuffler_key(), &config.keys.shuffler);
	}
}
