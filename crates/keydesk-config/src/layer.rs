// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	DomainsConfigLayer, GatewayConfigLayer, KeysConfigLayer, LimitsConfigLayer, LoggingConfigLayer,
	StorageConfigLayer,
};

/// Keydesk configuration layer; every field is optional for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeydeskConfigLayer {
	#[serde(default)]
	pub storage: Option<StorageConfigLayer>,
	#[serde(default)]
	pub keys: Option<KeysConfigLayer>,
	#[serde(default)]
	pub gateway: Option<GatewayConfigLayer>,
	#[serde(default)]
	pub limits: Option<LimitsConfigLayer>,
	#[serde(default)]
	pub domains: Option<DomainsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl KeydeskConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: KeydeskConfigLayer) {
		merge_option(&mut self.storage, other.storage, StorageConfigLayer::merge);
		merge_option(&mut self.keys, other.keys, KeysConfigLayer::merge);
		merge_option(&mut self.gateway, other.gateway, GatewayConfigLayer::merge);
		merge_option(&mut self.limits, other.limits, LimitsConfigLayer::merge);
		merge_option(&mut self.domains, other.domains, DomainsConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(b), Some(o)) => merge(b, o),
		(None, Some(o)) => *base = Some(o),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn merge_fills_and_overrides() {
		let mut base: KeydeskConfigLayer = toml::from_str(
			r#"
[storage]
dir = "/srv/keydesk"

[limits]
max_users = 100
"#,
		)
		.unwrap();
		let overlay: KeydeskConfigLayer = toml::from_str(
			r#"
[limits]
max_users = 20

[gateway]
url = "http://gw:8080"
"#,
		)
		.unwrap();
		base.merge(overlay);

		assert_eq!(
			base.storage.as_ref().and_then(|s| s.dir.clone()),
			Some(PathBuf::from("/srv/keydesk"))
		);
		assert_eq!(base.limits.as_ref().and_then(|l| l.max_users), Some(20));
		assert_eq!(
			base.gateway.as_ref().and_then(|g| g.url.as_deref()),
			Some("http://gw:8080")
		);
	}

	#[test]
	fn empty_document_is_empty_layer() {
		let layer: KeydeskConfigLayer = toml::from_str("").unwrap();
		assert!(layer.storage.is_none());
		assert!(layer.keys.is_none());
	}
}
