// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use keydesk_seal::SealedSecret;
use serde::{Deserialize, Serialize};

use crate::counters::UserQuota;
use crate::ids::UserId;
use crate::keys::WgPublicKey;
use crate::protocol::Protocol;
use crate::sections::{IpsecPeer, OutlinePeer, OvcPeer, Proto0Peer, SealedFields, WgPeer};

/// Transient reconciliation state. Only set while a patch is being applied;
/// a committed record never carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
	Create,
	Delete,
	Replay,
	Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub user_id: UserId,
	pub name: String,
	pub created_at: DateTime<Utc>,
	#[serde(default)]
	pub is_brigadier: bool,
	pub ipv4_addr: Ipv4Addr,
	pub ipv6_addr: Ipv6Addr,
	pub wg: WgPeer,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ovc: Option<OvcPeer>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ipsec: Option<IpsecPeer>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub outline: Option<OutlinePeer>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub proto0: Option<Proto0Peer>,
	#[serde(default)]
	pub is_blocked: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pending: Option<PendingAction>,
	#[serde(default)]
	pub quota: UserQuota,
}

impl User {
	/// The pair the reconciler matches users on.
	pub fn identity(&self) -> (UserId, WgPublicKey) {
		(self.user_id, self.wg.public_key)
	}

	pub fn has_protocol(&self, protocol: Protocol) -> bool {
		match protocol {
			Protocol::WireGuard => true,
			Protocol::Ovc => self.ovc.is_some(),
			Protocol::Ipsec => self.ipsec.is_some(),
			Protocol::Outline => self.outline.is_some(),
			Protocol::Proto0 => self.proto0.is_some(),
		}
	}

	pub fn protocols(&self) -> Vec<Protocol> {
		Protocol::ALL
			.into_iter()
			.filter(|p| self.has_protocol(*p))
			.collect()
	}

	pub fn drop_protocol(&mut self, protocol: Protocol) {
		match protocol {
			Protocol::WireGuard => {}
			Protocol::Ovc => self.ovc = None,
			Protocol::Ipsec => self.ipsec = None,
			Protocol::Outline => self.outline = None,
			Protocol::Proto0 => self.proto0 = None,
		}
	}

	/// Secret material the gateway sees for this peer: addresses, keys and
	/// every sealed value, but not bookkeeping such as name or counters.
	/// Two users with equal peer material need no gateway replay.
	pub fn same_peer_material(&self, other: &User) -> bool {
		self.ipv4_addr == other.ipv4_addr
			&& self.ipv6_addr == other.ipv6_addr
			&& self.is_brigadier == other.is_brigadier
			&& self.wg == other.wg
			&& self.ovc == other.ovc
			&& self.ipsec == other.ipsec
			&& self.outline == other.outline
			&& self.proto0 == other.proto0
	}
}

impl SealedFields for User {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		let mut fields = self.wg.sealed_fields();
		if let Some(ovc) = &self.ovc {
			fields.extend(ovc.sealed_fields());
		}
		if let Some(ipsec) = &self.ipsec {
			fields.extend(ipsec.sealed_fields());
		}
		if let Some(outline) = &self.outline {
			fields.extend(outline.sealed_fields());
		}
		if let Some(proto0) = &self.proto0 {
			fields.extend(proto0.sealed_fields());
		}
		fields
	}
}
