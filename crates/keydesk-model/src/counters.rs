// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Traffic and activity counters. Written by the stats collector, carried
//! through every other operation untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
	pub rx: u64,
	pub tx: u64,
}

impl Traffic {
	pub fn total(&self) -> u64 {
		self.rx.saturating_add(self.tx)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficCounters {
	#[serde(default)]
	pub total: Traffic,
	#[serde(default)]
	pub yearly: Traffic,
	#[serde(default)]
	pub monthly: Traffic,
	#[serde(default)]
	pub weekly: Traffic,
	#[serde(default)]
	pub daily: Traffic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastActivity {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub any: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub wg: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ovc: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ipsec: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub outline: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub proto0: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuota {
	#[serde(default)]
	pub counters: TrafficCounters,
	#[serde(default)]
	pub last_activity: LastActivity,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub throttle_until: Option<DateTime<Utc>>,
}

impl UserQuota {
	pub fn is_throttled(&self, now: DateTime<Utc>) -> bool {
		self.throttle_until.is_some_and(|until| until > now)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;

	#[test]
	fn throttle_deadline_in_future_throttles() {
		let now = Utc::now();
		let quota = UserQuota {
			throttle_until: Some(now + Duration::hours(1)),
			..Default::default()
		};
		assert!(quota.is_throttled(now));
		assert!(!quota.is_throttled(now + Duration::hours(2)));
	}

	#[test]
	fn traffic_total_saturates() {
		let t = Traffic {
			rx: u64::MAX,
			tx: 10,
		};
		assert_eq!(t.total(), u64::MAX);
	}
}
