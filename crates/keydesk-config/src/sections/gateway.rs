// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gateway control API endpoint.

use std::time::Duration;

use keydesk_seal::Plaintext;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
	pub url: String,
	/// Bearer token. Only ever loaded from `KEYDESK_GATEWAY_TOKEN[_FILE]`.
	pub token: Option<Plaintext>,
	pub timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
}

impl GatewayConfigLayer {
	pub fn merge(&mut self, other: GatewayConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
	}

	pub fn finalize(self, token: Option<Plaintext>) -> Result<GatewayConfig, ConfigError> {
		let url = self
			.url
			.filter(|u| !u.trim().is_empty())
			.ok_or_else(|| ConfigError::Missing("gateway.url (KEYDESK_GATEWAY_URL)".to_string()))?;
		if !(url.starts_with("http://") || url.starts_with("https://")) {
			return Err(ConfigError::InvalidValue {
				key: "gateway.url".to_string(),
				message: format!("'{url}' is not an http(s) URL"),
			});
		}
		let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS);
		if timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "gateway.timeout_secs".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		Ok(GatewayConfig {
			url,
			token,
			timeout: Duration::from_secs(timeout_secs),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn url_is_required() {
		assert!(matches!(
			GatewayConfigLayer::default().finalize(None),
			Err(ConfigError::Missing(_))
		));
	}

	#[test]
	fn rejects_non_http_url() {
		let layer = GatewayConfigLayer {
			url: Some("ftp://gw".to_string()),
			timeout_secs: None,
		};
		assert!(matches!(
			layer.finalize(None),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn finalizes_with_default_timeout() {
		let layer = GatewayConfigLayer {
			url: Some("http://10.0.0.1:8080/api".to_string()),
			timeout_secs: None,
		};
		let config = layer.finalize(Some(Plaintext::from("t"))).unwrap();
		assert_eq!(config.timeout, Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS));
		assert!(config.token.is_some());
	}
}
