// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
	#[serde(rename = "wg")]
	WireGuard,
	/// OpenVPN tunnelled through Cloak.
	Ovc,
	Ipsec,
	Outline,
	Proto0,
}

impl Protocol {
	pub const ALL: [Protocol; 5] = [
		Protocol::WireGuard,
		Protocol::Ovc,
		Protocol::Ipsec,
		Protocol::Outline,
		Protocol::Proto0,
	];

	/// Protocols that can be switched on and off per brigade. WireGuard is the
	/// interface every brigade is built on.
	pub const OPTIONAL: [Protocol; 4] = [
		Protocol::Ovc,
		Protocol::Ipsec,
		Protocol::Outline,
		Protocol::Proto0,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Protocol::WireGuard => "wg",
			Protocol::Ovc => "ovc",
			Protocol::Ipsec => "ipsec",
			Protocol::Outline => "outline",
			Protocol::Proto0 => "proto0",
		}
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Protocol {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"wg" | "wireguard" => Ok(Protocol::WireGuard),
			"ovc" | "openvpn" | "cloak" => Ok(Protocol::Ovc),
			"ipsec" | "l2tp" => Ok(Protocol::Ipsec),
			"outline" | "shadowsocks" => Ok(Protocol::Outline),
			"proto0" => Ok(Protocol::Proto0),
			other => Err(ModelError::UnknownProtocol(other.to_string())),
		}
	}
}
