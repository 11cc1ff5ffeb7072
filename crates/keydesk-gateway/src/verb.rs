// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use keydesk_protocols::params::{PEER_PUBLIC_KEY, WG_PUBLIC_KEY};
use keydesk_protocols::GatewayParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
	WgAdd,
	WgDel,
	PeerAdd,
	PeerDel,
	Stat,
}

impl Verb {
	pub fn as_str(&self) -> &'static str {
		match self {
			Verb::WgAdd => "wg_add",
			Verb::WgDel => "wg_del",
			Verb::PeerAdd => "peer_add",
			Verb::PeerDel => "peer_del",
			Verb::Stat => "stat",
		}
	}

	/// The key a call acts on: the peer for peer verbs, else the interface.
	pub fn target(&self, params: &GatewayParams) -> String {
		let key = match self {
			Verb::PeerAdd | Verb::PeerDel => PEER_PUBLIC_KEY,
			Verb::WgAdd | Verb::WgDel | Verb::Stat => WG_PUBLIC_KEY,
		};
		params.get(key).unwrap_or("-").to_string()
	}
}

impl fmt::Display for Verb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn target_prefers_peer_key_for_peer_verbs() {
		let params = GatewayParams::new()
			.with(WG_PUBLIC_KEY, "iface")
			.with(PEER_PUBLIC_KEY, "peer");
		assert_eq!(Verb::PeerAdd.target(&params), "peer");
		assert_eq!(Verb::WgAdd.target(&params), "iface");
		assert_eq!(Verb::PeerDel.target(&GatewayParams::new()), "-");
	}
}
