// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use ipnet::{Ipv4Net, Ipv6Net};
use keydesk_seal::SealedSecret;
use serde::{Deserialize, Serialize};

use crate::counters::TrafficCounters;
use crate::error::ValidationError;
use crate::ids::{BrigadeId, UserId};
use crate::keys::WgPublicKey;
use crate::protocol::Protocol;
use crate::sections::{IpsecSection, OutlineSection, OvcSection, Proto0Section, SealedFields};
use crate::user::User;

/// Newest record layout this build reads and writes. New fields are added
/// with serde defaults; a bump is only needed for incompatible changes.
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub text: String,
	pub created_at: DateTime<Utc>,
	#[serde(default)]
	pub is_read: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
	pub tier: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brigade {
	pub version: u32,
	pub brigade_id: BrigadeId,
	pub created_at: DateTime<Utc>,

	pub endpoint_ipv4: Ipv4Addr,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint_domain: Option<String>,
	pub endpoint_port: u16,
	pub dns_v4: Ipv4Addr,
	pub dns_v6: Ipv6Addr,
	pub ipv4_cgnat: Ipv4Net,
	pub ipv6_ula: Ipv6Net,
	pub keydesk_ipv6: Ipv6Addr,

	pub wg_public_key: WgPublicKey,
	pub wg_private: SealedSecret,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ovc: Option<OvcSection>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ipsec: Option<IpsecSection>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub outline: Option<OutlineSection>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub proto0: Option<Proto0Section>,

	#[serde(default)]
	pub users: Vec<User>,
	#[serde(default)]
	pub messages: Vec<Message>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subscription: Option<Subscription>,
	#[serde(default)]
	pub vip: bool,
	#[serde(default)]
	pub counters: TrafficCounters,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keydesk_last_visit: Option<DateTime<Utc>>,
}

impl Brigade {
	pub fn is_enabled(&self, protocol: Protocol) -> bool {
		match protocol {
			Protocol::WireGuard => true,
			Protocol::Ovc => self.ovc.is_some(),
			Protocol::Ipsec => self.ipsec.is_some(),
			Protocol::Outline => self.outline.is_some(),
			Protocol::Proto0 => self.proto0.is_some(),
		}
	}

	pub fn enabled_protocols(&self) -> Vec<Protocol> {
		Protocol::ALL
			.into_iter()
			.filter(|p| self.is_enabled(*p))
			.collect()
	}

	/// Host name end users connect to: the domain when one is set.
	pub fn endpoint_host(&self) -> String {
		self
			.endpoint_domain
			.clone()
			.unwrap_or_else(|| self.endpoint_ipv4.to_string())
	}

	pub fn brigadier(&self) -> Option<&User> {
		self.users.iter().find(|u| u.is_brigadier)
	}

	pub fn user(&self, user_id: &UserId) -> Option<&User> {
		self.users.iter().find(|u| &u.user_id == user_id)
	}

	pub fn user_mut(&mut self, user_id: &UserId) -> Option<&mut User> {
		self.users.iter_mut().find(|u| &u.user_id == user_id)
	}

	pub fn user_ids(&self) -> HashSet<UserId> {
		self.users.iter().map(|u| u.user_id).collect()
	}

	/// IPv4 addresses a new user must not receive: other users' addresses,
	/// the prefix network and broadcast addresses, and the gateway-side
	/// addresses when they fall inside the prefix.
	pub fn used_ipv4(&self) -> HashSet<Ipv4Addr> {
		let mut used: HashSet<Ipv4Addr> = self.users.iter().map(|u| u.ipv4_addr).collect();
		used.insert(self.ipv4_cgnat.network());
		used.insert(self.ipv4_cgnat.broadcast());
		if self.ipv4_cgnat.contains(&self.dns_v4) {
			used.insert(self.dns_v4);
		}
		used
	}

	pub fn used_ipv6(&self) -> HashSet<Ipv6Addr> {
		let mut used: HashSet<Ipv6Addr> = self.users.iter().map(|u| u.ipv6_addr).collect();
		used.insert(self.ipv6_ula.network());
		used.insert(self.ipv6_ula.broadcast());
		for gw in [self.dns_v6, self.keydesk_ipv6] {
			if self.ipv6_ula.contains(&gw) {
				used.insert(gw);
			}
		}
		used
	}

	/// Switch a protocol off: the brigade section and every user's section go.
	pub fn drop_protocol(&mut self, protocol: Protocol) {
		match protocol {
			Protocol::WireGuard => return,
			Protocol::Ovc => self.ovc = None,
			Protocol::Ipsec => self.ipsec = None,
			Protocol::Outline => self.outline = None,
			Protocol::Proto0 => self.proto0 = None,
		}
		for user in &mut self.users {
			user.drop_protocol(protocol);
		}
	}

	/// Check every invariant a committed record must satisfy.
	pub fn validate(&self, max_users: usize) -> Result<(), ValidationError> {
		if self.version > RECORD_VERSION {
			return Err(ValidationError::UnsupportedVersion {
				found: self.version,
				supported: RECORD_VERSION,
			});
		}

		let brigadiers = self.users.iter().filter(|u| u.is_brigadier).count();
		if brigadiers > 1 {
			return Err(ValidationError::MultipleBrigadiers(brigadiers));
		}

		if self.users.len() > max_users {
			return Err(ValidationError::TooManyUsers {
				count: self.users.len(),
				max: max_users,
			});
		}

		self.validate_sealed()?;
		self.validate_users()
	}

	fn validate_sealed(&self) -> Result<(), ValidationError> {
		let mut fields: Vec<(String, &SealedSecret)> = vec![("wg_private".to_string(), &self.wg_private)];
		if let Some(ovc) = &self.ovc {
			fields.extend(ovc.sealed_fields().into_iter().map(|(n, s)| (n.to_string(), s)));
		}
		if let Some(ipsec) = &self.ipsec {
			fields.extend(ipsec.sealed_fields().into_iter().map(|(n, s)| (n.to_string(), s)));
		}
		for user in &self.users {
			fields.extend(
				user
					.sealed_fields()
					.into_iter()
					.map(|(n, s)| (format!("users[{}].{n}", user.user_id), s)),
			);
		}

		match fields.into_iter().find(|(_, s)| !s.is_paired()) {
			Some((field, _)) => Err(ValidationError::UnpairedSecret { field }),
			None => Ok(()),
		}
	}

	fn validate_users(&self) -> Result<(), ValidationError> {
		let mut ids = HashSet::new();
		let mut addrs: HashSet<IpAddr> = HashSet::new();

		let reserved_v4 = [self.ipv4_cgnat.network(), self.ipv4_cgnat.broadcast(), self.dns_v4];
		let reserved_v6 = [
			self.ipv6_ula.network(),
			self.ipv6_ula.broadcast(),
			self.dns_v6,
			self.keydesk_ipv6,
		];

		for user in &self.users {
			if !ids.insert(user.user_id) {
				return Err(ValidationError::DuplicateUserId(user.user_id));
			}

			if user.pending.is_some() {
				return Err(ValidationError::PendingAction(user.user_id));
			}

			for protocol in user.protocols() {
				if !self.is_enabled(protocol) {
					return Err(ValidationError::ProtocolNotEnabled {
						user_id: user.user_id,
						protocol,
					});
				}
			}

			if !self.ipv4_cgnat.contains(&user.ipv4_addr) {
				return Err(ValidationError::AddressOutsidePrefix {
					user_id: user.user_id,
					addr: user.ipv4_addr.into(),
				});
			}
			if !self.ipv6_ula.contains(&user.ipv6_addr) {
				return Err(ValidationError::AddressOutsidePrefix {
					user_id: user.user_id,
					addr: user.ipv6_addr.into(),
				});
			}
			if reserved_v4.contains(&user.ipv4_addr) {
				return Err(ValidationError::ReservedAddress {
					user_id: user.user_id,
					addr: user.ipv4_addr.into(),
				});
			}
			if reserved_v6.contains(&user.ipv6_addr) {
				return Err(ValidationError::ReservedAddress {
					user_id: user.user_id,
					addr: user.ipv6_addr.into(),
				});
			}

			for addr in [IpAddr::from(user.ipv4_addr), IpAddr::from(user.ipv6_addr)] {
				if !addrs.insert(addr) {
					return Err(ValidationError::DuplicateAddress { addr });
				}
			}
		}

		Ok(())
	}
}
