// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use keydesk_model::{Brigade, ExposedPsk, IpsecPeer, IpsecSection, Protocol};
use keydesk_seal::{Plaintext, Sealer};
use tracing::instrument;

use crate::error::{ProtocolError, Result};
use crate::generator::{Generated, ProtocolGenerator, UserSeed};
use crate::params::ipsec_peer_params;
use crate::random;

pub const PSK_LEN: usize = 32;
pub const USERNAME_LEN: usize = 16;
pub const PASSWORD_LEN: usize = 24;

/// Brigade-wide PSK, sealed plus the plaintext copy every later user's client
/// config is rendered from.
pub fn new_section(sealer: &Sealer) -> Result<IpsecSection> {
	let psk = random::alphanumeric(PSK_LEN);
	Ok(IpsecSection {
		psk: sealer.seal(psk.as_bytes())?,
		psk_plaintext: ExposedPsk::new(psk),
	})
}

#[derive(Debug, Clone)]
pub struct IpsecClientConfig {
	pub server: String,
	pub psk: Plaintext,
	pub username: Plaintext,
	pub password: Plaintext,
}

impl IpsecClientConfig {
	pub fn render(&self) -> Plaintext {
		Plaintext::from(format!(
			"Type: L2TP/IPSec PSK\n\
			 Server: {}\n\
			 PSK: {}\n\
			 Username: {}\n\
			 Password: {}\n",
			self.server,
			self.psk.expose_text(),
			self.username.expose_text(),
			self.password.expose_text(),
		))
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Ipsec;

impl ProtocolGenerator for Ipsec {
	type Client = IpsecClientConfig;
	type Persisted = IpsecPeer;

	const PROTOCOL: Protocol = Protocol::Ipsec;

	#[instrument(skip_all, fields(user_id = %seed.user_id))]
	fn generate(
		&self,
		sealer: &Sealer,
		brigade: &Brigade,
		seed: &UserSeed,
	) -> Result<Generated<IpsecClientConfig, IpsecPeer>> {
		let section = brigade
			.ipsec
			.as_ref()
			.ok_or(ProtocolError::NotEnabled(Protocol::Ipsec))?;

		let username = Plaintext::from(random::alphanumeric(USERNAME_LEN));
		let password = Plaintext::from(random::alphanumeric(PASSWORD_LEN));

		let persisted = IpsecPeer {
			username: sealer.seal_plaintext(&username)?,
			password: sealer.seal_plaintext(&password)?,
		};
		let params = ipsec_peer_params(&persisted);

		let client = IpsecClientConfig {
			server: brigade.endpoint_host(),
			psk: Plaintext::from(section.psk_plaintext.expose()),
			username,
			password,
		};

		Ok(Generated {
			client,
			params,
			persisted,
		})
	}
}
