// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_MAX_USERS: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitsConfig {
	/// Users per brigade, brigadier included.
	pub max_users: usize,
}

impl Default for LimitsConfig {
	fn default() -> Self {
		Self {
			max_users: DEFAULT_MAX_USERS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitsConfigLayer {
	#[serde(default)]
	pub max_users: Option<usize>,
}

impl LimitsConfigLayer {
	pub fn merge(&mut self, other: LimitsConfigLayer) {
		if other.max_users.is_some() {
			self.max_users = other.max_users;
		}
	}

	pub fn finalize(self) -> Result<LimitsConfig, ConfigError> {
		let max_users = self.max_users.unwrap_or(DEFAULT_MAX_USERS);
		if max_users == 0 {
			return Err(ConfigError::InvalidValue {
				key: "limits.max_users".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		Ok(LimitsConfig { max_users })
	}
}
