// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use keydesk_model::{Brigade, Protocol, WgPeer, WgPublicKey};
use keydesk_seal::{Plaintext, SealedSecret, Sealer};
use rand::rngs::OsRng;
use tracing::instrument;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::Result;
use crate::generator::{Generated, ProtocolGenerator, UserSeed};
use crate::params::wg_peer_params;
use crate::random;

/// A fresh X25519 keypair: the public key in the clear, the private key
/// sealed.
pub fn new_interface_keys(sealer: &Sealer) -> Result<(WgPublicKey, SealedSecret)> {
	let (public, private) = keypair();
	Ok((public, sealer.seal_plaintext(&private)?))
}

fn keypair() -> (WgPublicKey, Plaintext) {
	let secret = StaticSecret::random_from_rng(OsRng);
	let public = WgPublicKey::from_bytes(PublicKey::from(&secret).to_bytes());
	let private = Plaintext::from(STANDARD.encode(secret.to_bytes()));
	(public, private)
}

/// wg-quick client configuration.
#[derive(Debug, Clone)]
pub struct WgClientConfig {
	pub private_key: Plaintext,
	pub preshared_key: Plaintext,
	pub address: String,
	pub dns: String,
	pub server_public_key: WgPublicKey,
	pub endpoint: String,
	pub allowed_ips: String,
}

impl WgClientConfig {
	pub fn render(&self) -> Plaintext {
		Plaintext::from(format!(
			"[Interface]\n\
			 Address = {}\n\
			 PrivateKey = {}\n\
			 DNS = {}\n\
			 \n\
			 [Peer]\n\
			 Endpoint = {}\n\
			 PublicKey = {}\n\
			 PresharedKey = {}\n\
			 AllowedIPs = {}\n",
			self.address,
			self.private_key.expose_text(),
			self.dns,
			self.endpoint,
			self.server_public_key,
			self.preshared_key.expose_text(),
			self.allowed_ips,
		))
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WireGuard;

impl ProtocolGenerator for WireGuard {
	type Client = WgClientConfig;
	type Persisted = WgPeer;

	const PROTOCOL: Protocol = Protocol::WireGuard;

	#[instrument(skip_all, fields(user_id = %seed.user_id))]
	fn generate(
		&self,
		sealer: &Sealer,
		brigade: &Brigade,
		seed: &UserSeed,
	) -> Result<Generated<WgClientConfig, WgPeer>> {
		let (public_key, private_key) = keypair();
		let psk = Plaintext::from(STANDARD.encode(random::bytes::<32>()));

		let persisted = WgPeer {
			public_key,
			private_key: sealer.seal_plaintext(&private_key)?,
			psk: sealer.seal_plaintext(&psk)?,
		};
		let params = wg_peer_params(brigade, &persisted, seed.ipv4_addr, seed.ipv6_addr);

		let client = WgClientConfig {
			private_key,
			preshared_key: psk,
			address: format!("{}/32,{}/128", seed.ipv4_addr, seed.ipv6_addr),
			dns: format!("{},{}", brigade.dns_v4, brigade.dns_v6),
			server_public_key: brigade.wg_public_key,
			endpoint: format!("{}:{}", brigade.endpoint_host(), brigade.endpoint_port),
			allowed_ips: "0.0.0.0/0,::/0".to_string(),
		};

		Ok(Generated {
			client,
			params,
			persisted,
		})
	}
}
