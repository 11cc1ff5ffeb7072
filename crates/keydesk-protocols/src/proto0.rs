// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Proto0: TLS-camouflaged tunnel keyed by a long id and a short id, fronting
//! a borrowed domain.

use keydesk_model::{Brigade, Proto0Peer, Proto0Section, Protocol};
use keydesk_seal::{Plaintext, Sealer};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProtocolError, Result};
use crate::generator::{Generated, ProtocolGenerator, UserSeed};
use crate::ovc::OPENVPN_PORT;
use crate::params::proto0_peer_params;
use crate::random;

pub const DEFAULT_PORT: u16 = 443;
pub const PORT_RANGE: std::ops::RangeInclusive<u16> = 1024..=65535;

/// Ports the brigade already listens on, apart from Proto0's own.
pub(crate) fn taken_ports(brigade: &Brigade) -> Vec<u16> {
	let mut taken = vec![brigade.endpoint_port];
	if let Some(outline) = &brigade.outline {
		taken.push(outline.port);
	}
	if brigade.ovc.is_some() {
		taken.push(OPENVPN_PORT);
	}
	taken
}

/// Port 443 unless the brigade already listens there.
pub fn new_section(brigade: &Brigade, fake_domain: String) -> Result<Proto0Section> {
	let taken = taken_ports(brigade);
	let port = if taken.contains(&DEFAULT_PORT) {
		random::port(PORT_RANGE, &taken).ok_or(ProtocolError::NoFreePort(Protocol::Proto0))?
	} else {
		DEFAULT_PORT
	};
	Ok(Proto0Section { fake_domain, port })
}

#[derive(Debug, Clone)]
pub struct Proto0ClientConfig {
	pub uri: Plaintext,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Proto0;

impl ProtocolGenerator for Proto0 {
	type Client = Proto0ClientConfig;
	type Persisted = Proto0Peer;

	const PROTOCOL: Protocol = Protocol::Proto0;

	#[instrument(skip_all, fields(user_id = %seed.user_id))]
	fn generate(
		&self,
		sealer: &Sealer,
		brigade: &Brigade,
		seed: &UserSeed,
	) -> Result<Generated<Proto0ClientConfig, Proto0Peer>> {
		let section = brigade
			.proto0
			.as_ref()
			.ok_or(ProtocolError::NotEnabled(Protocol::Proto0))?;

		let long_id = Plaintext::from(Uuid::new_v4().to_string());
		let short_id = Plaintext::from(hex::encode(random::bytes::<8>()));

		let persisted = Proto0Peer {
			long_id: sealer.seal_plaintext(&long_id)?,
			short_id: sealer.seal_plaintext(&short_id)?,
		};
		let params = proto0_peer_params(&persisted);

		let uri = format!(
			"proto0://{}@{}:{}?sni={}&sid={}#{}",
			long_id.expose_text(),
			brigade.endpoint_host(),
			section.port,
			section.fake_domain,
			short_id.expose_text(),
			seed.name.replace(' ', "_"),
		);

		Ok(Generated {
			client: Proto0ClientConfig {
				uri: Plaintext::from(uri),
			},
			params,
			persisted,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_model::testing::{sample_brigade, test_custodians};
	use keydesk_seal::Custodian;

	fn seed() -> UserSeed {
		UserSeed {
			user_id: Uuid::new_v4(),
			name: "005 Lucky Yak".to_string(),
			ipv4_addr: "100.64.0.24".parse().unwrap(),
			ipv6_addr: "fd00:1::24".parse().unwrap(),
			is_brigadier: false,
		}
	}

	#[test]
	fn ids_have_expected_shape() {
		let (router, _, sealer) = test_custodians();
		let brigade = sample_brigade(&sealer, 0);
		let out = Proto0.generate(&sealer, &brigade, &seed()).unwrap();

		let long = out
			.persisted
			.long_id
			.open(Custodian::Router, router.private_key())
			.unwrap();
		assert!(Uuid::parse_str(&long.expose_text()).is_ok());

		let short = out
			.persisted
			.short_id
			.open(Custodian::Router, router.private_key())
			.unwrap();
		assert_eq!(hex::decode(short.expose()).unwrap().len(), 8);

		let uri = out.client.uri.expose_text().into_owned();
		assert!(uri.contains("sni=www.example.com"));
		assert!(uri.contains(&format!("sid={}", short.expose_text())));
	}

	#[test]
	fn section_moves_off_443_when_taken() {
		let (_, _, sealer) = test_custodians();
		let mut brigade = sample_brigade(&sealer, 0);
		brigade.drop_protocol(Protocol::Ovc);
		assert_eq!(
			new_section(&brigade, "a.example".into()).unwrap().port,
			DEFAULT_PORT
		);
		brigade.endpoint_port = 443;
		let port = new_section(&brigade, "a.example".into()).unwrap().port;
		assert_ne!(port, 443);
	}

	#[test]
	fn section_avoids_the_openvpn_port() {
		let (_, _, sealer) = test_custodians();
		let brigade = sample_brigade(&sealer, 0);
		assert!(brigade.ovc.is_some());
		let section = new_section(&brigade, "a.example".into()).unwrap();
		assert_ne!(section.port, OPENVPN_PORT);
		assert!(!taken_ports(&brigade).contains(&section.port));
	}
}
