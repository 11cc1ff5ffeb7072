// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router-facing parameters for the gateway control verbs.
//!
//! Public values travel in plaintext. Secret values travel as the base64
//! router copy of their [`SealedSecret`](keydesk_seal::SealedSecret); the
//! shuffler copy never leaves the record.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use keydesk_model::{Brigade, IpsecPeer, OutlinePeer, OvcPeer, Proto0Peer, User, WgPeer};
use serde::{Deserialize, Serialize};

pub const WG_PUBLIC_KEY: &str = "wg-public-key";
pub const WG_PRIVATE_ROUTER_ENC: &str = "wg-private-router-enc";
pub const ENDPOINT_IPV4: &str = "endpoint-ipv4";
pub const ENDPOINT_PORT: &str = "endpoint-port";
pub const DNS_IPV4: &str = "dns-ipv4";
pub const DNS_IPV6: &str = "dns-ipv6";
pub const IPV4_CGNAT: &str = "ipv4-cgnat";
pub const IPV6_ULA: &str = "ipv6-ula";
pub const KEYDESK_IPV6: &str = "keydesk-ipv6";
pub const CLOAK_DOMAIN: &str = "cloak-domain";
pub const OPENVPN_CA_CRT: &str = "openvpn-ca-crt";
pub const OPENVPN_CA_KEY_ROUTER_ENC: &str = "openvpn-ca-key-router-enc";
pub const L2TP_PRESHARED_KEY_ROUTER_ENC: &str = "l2tp-preshared-key-router-enc";
pub const OUTLINE_SS_PORT: &str = "outline-ss-port";
pub const PROTO0_DOMAIN: &str = "proto0-domain";
pub const PROTO0_PORT: &str = "proto0-port";

pub const PEER_PUBLIC_KEY: &str = "peer-public-key";
pub const WG_PSK_ROUTER_ENC: &str = "wg-psk-router-enc";
pub const ALLOWED_IPS: &str = "allowed-ips";
pub const CONTROL_HOST: &str = "control-host";
pub const OPENVPN_CLIENT_CSR: &str = "openvpn-client-csr";
pub const CLOAK_UID_ROUTER_ENC: &str = "cloak-uid-router-enc";
pub const L2TP_USERNAME_ROUTER_ENC: &str = "l2tp-username-router-enc";
pub const L2TP_PASSWORD_ROUTER_ENC: &str = "l2tp-password-router-enc";
pub const OUTLINE_SS_PASSWORD_ROUTER_ENC: &str = "outline-ss-password-router-enc";
pub const PROTO0_ID_ROUTER_ENC: &str = "proto0-id-router-enc";
pub const PROTO0_SHORT_ID_ROUTER_ENC: &str = "proto0-short-id-router-enc";

/// Named string parameters of one gateway call, kept in key order so calls
/// are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayParams(BTreeMap<String, String>);

impl GatewayParams {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
		self.0.insert(key.to_string(), value.into());
		self
	}

	pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn extend(&mut self, other: GatewayParams) {
		self.0.extend(other.0);
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

/// `wg_add` parameters: the interface and every enabled protocol section.
pub fn interface_params(brigade: &Brigade) -> GatewayParams {
	let mut params = GatewayParams::new()
		.with(WG_PUBLIC_KEY, brigade.wg_public_key.to_base64())
		.with(WG_PRIVATE_ROUTER_ENC, brigade.wg_private.router_base64())
		.with(ENDPOINT_IPV4, brigade.endpoint_ipv4.to_string())
		.with(ENDPOINT_PORT, brigade.endpoint_port.to_string())
		.with(DNS_IPV4, brigade.dns_v4.to_string())
		.with(DNS_IPV6, brigade.dns_v6.to_string())
		.with(IPV4_CGNAT, brigade.ipv4_cgnat.to_string())
		.with(IPV6_ULA, brigade.ipv6_ula.to_string())
		.with(KEYDESK_IPV6, brigade.keydesk_ipv6.to_string());

	if let Some(ovc) = &brigade.ovc {
		params
			.insert(CLOAK_DOMAIN, ovc.cloak_fake_domain.clone())
			.insert(OPENVPN_CA_CRT, ovc.ca_cert_pem.clone())
			.insert(OPENVPN_CA_KEY_ROUTER_ENC, ovc.ca_key.router_base64());
	}
	if let Some(ipsec) = &brigade.ipsec {
		params.insert(L2TP_PRESHARED_KEY_ROUTER_ENC, ipsec.psk.router_base64());
	}
	if let Some(outline) = &brigade.outline {
		params.insert(OUTLINE_SS_PORT, outline.port.to_string());
	}
	if let Some(proto0) = &brigade.proto0 {
		params
			.insert(PROTO0_DOMAIN, proto0.fake_domain.clone())
			.insert(PROTO0_PORT, proto0.port.to_string());
	}
	params
}

pub fn wg_del_params(brigade: &Brigade) -> GatewayParams {
	GatewayParams::new().with(WG_PUBLIC_KEY, brigade.wg_public_key.to_base64())
}

/// `peer_add` parameters for a stored user. The brigadier additionally gets
/// the keydesk address as `control-host`.
pub fn peer_params(brigade: &Brigade, user: &User) -> GatewayParams {
	let mut params = wg_peer_params(brigade, &user.wg, user.ipv4_addr, user.ipv6_addr);
	if user.is_brigadier {
		params.insert(CONTROL_HOST, brigade.keydesk_ipv6.to_string());
	}
	if let Some(ovc) = &user.ovc {
		params.extend(ovc_peer_params(ovc));
	}
	if let Some(ipsec) = &user.ipsec {
		params.extend(ipsec_peer_params(ipsec));
	}
	if let Some(outline) = &user.outline {
		params.extend(outline_peer_params(outline));
	}
	if let Some(proto0) = &user.proto0 {
		params.extend(proto0_peer_params(proto0));
	}
	params
}

pub fn wg_peer_params(
	brigade: &Brigade,
	wg: &WgPeer,
	ipv4_addr: Ipv4Addr,
	ipv6_addr: Ipv6Addr,
) -> GatewayParams {
	GatewayParams::new()
		.with(WG_PUBLIC_KEY, brigade.wg_public_key.to_base64())
		.with(PEER_PUBLIC_KEY, wg.public_key.to_base64())
		.with(WG_PSK_ROUTER_ENC, wg.psk.router_base64())
		.with(ALLOWED_IPS, format!("{ipv4_addr}/32,{ipv6_addr}/128"))
}

pub fn ovc_peer_params(ovc: &OvcPeer) -> GatewayParams {
	GatewayParams::new()
		.with(OPENVPN_CLIENT_CSR, ovc.csr_pem.clone())
		.with(CLOAK_UID_ROUTER_ENC, ovc.cloak_uid.router_base64())
}

pub fn ipsec_peer_params(ipsec: &IpsecPeer) -> GatewayParams {
	GatewayParams::new()
		.with(L2TP_USERNAME_ROUTER_ENC, ipsec.username.router_base64())
		.with(L2TP_PASSWORD_ROUTER_ENC, ipsec.password.router_base64())
}

pub fn outline_peer_params(outline: &OutlinePeer) -> GatewayParams {
	GatewayParams::new().with(OUTLINE_SS_PASSWORD_ROUTER_ENC, outline.secret.router_base64())
}

pub fn proto0_peer_params(proto0: &Proto0Peer) -> GatewayParams {
	GatewayParams::new()
		.with(PROTO0_ID_ROUTER_ENC, proto0.long_id.router_base64())
		.with(PROTO0_SHORT_ID_ROUTER_ENC, proto0.short_id.router_base64())
}

pub fn peer_del_params(brigade: &Brigade, user: &User) -> GatewayParams {
	GatewayParams::new()
		.with(WG_PUBLIC_KEY, brigade.wg_public_key.to_base64())
		.with(PEER_PUBLIC_KEY, user.wg.public_key.to_base64())
}

pub fn stat_params(brigade: &Brigade) -> GatewayParams {
	wg_del_params(brigade)
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_model::testing::{sample_brigade, test_custodians};
	use keydesk_seal::Custodian;

	#[test]
	fn interface_params_cover_enabled_sections() {
		let (_, _, sealer) = test_custodians();
		let mut brigade = sample_brigade(&sealer, 0);
		let params = interface_params(&brigade);
		for key in [
			WG_PUBLIC_KEY,
			WG_PRIVATE_ROUTER_ENC,
			IPV4_CGNAT,
			KEYDESK_IPV6,
			CLOAK_DOMAIN,
			OPENVPN_CA_CRT,
			OPENVPN_CA_KEY_ROUTER_ENC,
			L2TP_PRESHARED_KEY_ROUTER_ENC,
			OUTLINE_SS_PORT,
			PROTO0_DOMAIN,
			PROTO0_PORT,
		] {
			assert!(params.contains(key), "missing {key}");
		}

		brigade.ovc = None;
		brigade.proto0 = None;
		let params = interface_params(&brigade);
		assert!(!params.contains(CLOAK_DOMAIN));
		assert!(!params.contains(PROTO0_PORT));
	}

	#[test]
	fn secrets_travel_as_router_ciphertext() {
		let (router, _, sealer) = test_custodians();
		let brigade = sample_brigade(&sealer, 2);
		let params = peer_params(&brigade, &brigade.users[1]);

		let enc = params.get(WG_PSK_ROUTER_ENC).unwrap();
		assert_eq!(enc, brigade.users[1].wg.psk.router_base64());
		assert_ne!(enc, "wg-psk");

		let opened = brigade.users[1]
			.wg
			.psk
			.open(Custodian::Router, router.private_key())
			.unwrap();
		assert_eq!(opened.expose(), b"wg-psk");
	}

	#[test]
	fn only_brigadier_gets_control_host() {
		let (_, _, sealer) = test_custodians();
		let brigade = sample_brigade(&sealer, 2);
		assert_eq!(
			peer_params(&brigade, &brigade.users[0]).get(CONTROL_HOST),
			Some(brigade.keydesk_ipv6.to_string().as_str())
		);
		assert!(!peer_params(&brigade, &brigade.users[1]).contains(CONTROL_HOST));
	}

	#[test]
	fn allowed_ips_are_host_routes() {
		let (_, _, sealer) = test_custodians();
		let brigade = sample_brigade(&sealer, 1);
		let user = &brigade.users[0];
		assert_eq!(
			peer_params(&brigade, user).get(ALLOWED_IPS).unwrap(),
			format!("{}/32,{}/128", user.ipv4_addr, user.ipv6_addr)
		);
	}
}
