// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fake-domain pool for Cloak and Proto0 camouflage.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainsConfig {
	pub fake_domains: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainsConfigLayer {
	#[serde(default)]
	pub fake_domains: Option<Vec<String>>,
}

impl DomainsConfigLayer {
	pub fn merge(&mut self, other: DomainsConfigLayer) {
		if other.fake_domains.is_some() {
			self.fake_domains = other.fake_domains;
		}
	}

	pub fn finalize(self) -> DomainsConfig {
		let mut fake_domains: Vec<String> = self
			.fake_domains
			.unwrap_or_default()
			.into_iter()
			.map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
			.filter(|d| !d.is_empty())
			.collect();
		fake_domains.dedup();
		DomainsConfig { fake_domains }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_entries() {
		let layer: DomainsConfigLayer =
			toml::from_str(r#"fake_domains = ["CDN.example.org.", "", "cdn.example.org", "a.example"]"#)
				.unwrap();
		assert_eq!(
			layer.finalize().fake_domains,
			vec!["cdn.example.org".to_string(), "a.example".to_string()]
		);
	}

	#[test]
	fn empty_by_default() {
		assert!(DomainsConfigLayer::default().finalize().fake_domains.is_empty());
	}
}
