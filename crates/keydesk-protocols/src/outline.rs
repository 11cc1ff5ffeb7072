// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outline (Shadowsocks) access keys.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use keydesk_model::{Brigade, OutlinePeer, OutlineSection, Protocol};
use keydesk_seal::{Plaintext, Sealer};
use tracing::instrument;

use crate::error::{ProtocolError, Result};
use crate::generator::{Generated, ProtocolGenerator, UserSeed};
use crate::params::outline_peer_params;
use crate::random;

pub const CIPHER: &str = "chacha20-ietf-poly1305";
pub const PORT_RANGE: std::ops::RangeInclusive<u16> = 1024..=65535;

/// Pick a listening port that does not clash with the other brigade ports.
pub fn new_section(brigade: &Brigade) -> Result<OutlineSection> {
	let mut taken = vec![brigade.endpoint_port];
	if let Some(proto0) = &brigade.proto0 {
		taken.push(proto0.port);
	}
	let port = random::port(PORT_RANGE, &taken).ok_or(ProtocolError::NoFreePort(Protocol::Outline))?;
	Ok(OutlineSection { port })
}

#[derive(Debug, Clone)]
pub struct OutlineClientConfig {
	/// `ss://` URI as imported by Outline clients.
	pub access_key: Plaintext,
}

pub fn access_key(host: &str, port: u16, secret: &str, name: &str) -> String {
	let userinfo = URL_SAFE_NO_PAD.encode(format!("{CIPHER}:{secret}"));
	let tag: String = name
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
		.collect();
	format!("ss://{userinfo}@{host}:{port}/?outline=1#{tag}")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Outline;

impl ProtocolGenerator for Outline {
	type Client = OutlineClientConfig;
	type Persisted = OutlinePeer;

	const PROTOCOL: Protocol = Protocol::Outline;

	#[instrument(skip_all, fields(user_id = %seed.user_id))]
	fn generate(
		&self,
		sealer: &Sealer,
		brigade: &Brigade,
		seed: &UserSeed,
	) -> Result<Generated<OutlineClientConfig, OutlinePeer>> {
		let section = brigade
			.outline
			.as_ref()
			.ok_or(ProtocolError::NotEnabled(Protocol::Outline))?;

		let secret = Plaintext::from(STANDARD.encode(random::bytes::<24>()));
		let persisted = OutlinePeer {
			secret: sealer.seal_plaintext(&secret)?,
		};
		let params = outline_peer_params(&persisted);

		let client = OutlineClientConfig {
			access_key: Plaintext::from(access_key(
				&brigade.endpoint_host(),
				section.port,
				&secret.expose_text(),
				&seed.name,
			)),
		};

		Ok(Generated {
			client,
			params,
			persisted,
		})
	}
}
