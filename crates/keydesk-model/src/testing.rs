// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Record fixtures shared by the tests of every keydesk crate.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{TimeZone, Utc};
use keydesk_seal::{SealKeyPair, SealedSecret, Sealer};

use crate::brigade::{Brigade, RECORD_VERSION};
use crate::counters::{TrafficCounters, UserQuota};
use crate::ids::BrigadeId;
use crate::keys::WgPublicKey;
use crate::sections::{
	ExposedPsk, IpsecPeer, IpsecSection, OutlinePeer, OutlineSection, OvcPeer, OvcSection,
	Proto0Peer, Proto0Section, WgPeer,
};
use crate::user::User;

pub fn test_custodians() -> (SealKeyPair, SealKeyPair, Sealer) {
	let router = SealKeyPair::generate();
	let shuffler = SealKeyPair::generate();
	let sealer = Sealer::new(router.public_key(), shuffler.public_key());
	(router, shuffler, sealer)
}

pub fn test_sealer() -> Sealer {
	test_custodians().2
}

fn sealed(sealer: &Sealer, value: &str) -> SealedSecret {
	sealer.seal(value.as_bytes()).expect("seal fixture")
}

/// A brigade with every protocol enabled and `users` users, the first of
/// which is the brigadier.
pub fn sample_brigade(sealer: &Sealer, users: usize) -> Brigade {
	let mut brigade = Brigade {
		version: RECORD_VERSION,
		brigade_id: BrigadeId::new(),
		created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
		endpoint_ipv4: Ipv4Addr::new(203, 0, 113, 10),
		endpoint_domain: Some("vpn.example.net".to_string()),
		endpoint_port: 51820,
		dns_v4: Ipv4Addr::new(100, 64, 0, 1),
		dns_v6: "fd00:1::1".parse().unwrap(),
		ipv4_cgnat: "100.64.0.0/24".parse().unwrap(),
		ipv6_ula: "fd00:1::/64".parse().unwrap(),
		keydesk_ipv6: "fd00:1::2".parse().unwrap(),
		wg_public_key: WgPublicKey::from_bytes([0xAB; 32]),
		wg_private: sealed(sealer, "brigade-wg-private"),
		ovc: Some(OvcSection {
			cloak_fake_domain: "cdn.example.org".to_string(),
			ca_cert_pem: "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n"
				.to_string(),
			ca_key: sealed(sealer, "ca-key"),
		}),
		ipsec: Some(IpsecSection {
			psk: sealed(sealer, "ipsec-psk"),
			psk_plaintext: ExposedPsk::new("ipsec-psk".to_string()),
		}),
		outline: Some(OutlineSection { port: 40123 }),
		proto0: Some(Proto0Section {
			fake_domain: "www.example.com".to_string(),
			port: 443,
		}),
		users: Vec::new(),
		messages: Vec::new(),
		subscription: None,
		vip: false,
		counters: TrafficCounters::default(),
		keydesk_last_visit: None,
	};

	for i in 0..users {
		let user = sample_user(sealer, &brigade, i as u8, i == 0);
		brigade.users.push(user);
	}
	brigade
}

/// A user numbered `n` with material for every protocol the brigade has on.
pub fn sample_user(sealer: &Sealer, brigade: &Brigade, n: u8, brigadier: bool) -> User {
	let v4 = u32::from(brigade.ipv4_cgnat.network()) + 10 + u32::from(n);
	let v6 = u128::from(brigade.ipv6_ula.network()) + 10 + u128::from(n);
	User {
		user_id: uuid::Uuid::new_v4(),
		name: format!("user {n}"),
		created_at: Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap(),
		is_brigadier: brigadier,
		ipv4_addr: Ipv4Addr::from(v4),
		ipv6_addr: Ipv6Addr::from(v6),
		wg: WgPeer {
			public_key: WgPublicKey::from_bytes([n.wrapping_add(1); 32]),
			private_key: sealed(sealer, "wg-private"),
			psk: sealed(sealer, "wg-psk"),
		},
		ovc: brigade.ovc.as_ref().map(|_| OvcPeer {
			csr_pem: "-----BEGIN CERTIFICATE REQUEST-----\n-----END CERTIFICATE REQUEST-----\n"
				.to_string(),
			client_key: sealed(sealer, "client-key"),
			cloak_uid: sealed(sealer, "cloak-uid"),
		}),
		ipsec: brigade.ipsec.as_ref().map(|_| IpsecPeer {
			username: sealed(sealer, "username"),
			password: sealed(sealer, "password"),
		}),
		outline: brigade.outline.as_ref().map(|_| OutlinePeer {
			secret: sealed(sealer, "outline-secret"),
		}),
		proto0: brigade.proto0.as_ref().map(|_| Proto0Peer {
			long_id: sealed(sealer, "long-id"),
			short_id: sealed(sealer, "short-id"),
		}),
		is_blocked: false,
		pending: None,
		quota: UserQuota::default(),
	}
}
