// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Optional per-protocol sections of brigade and user records.
//!
//! Brigade sections hold the interface-wide settings of a protocol; peer
//! sections hold one user's material. A protocol is enabled for a brigade
//! exactly when its brigade section is present.

use std::fmt;

use keydesk_seal::{SealedSecret, REDACTED};
use serde::{Deserialize, Serialize};

use crate::keys::WgPublicKey;

/// Anything that carries sealed material, named for error reporting.
pub trait SealedFields {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvcSection {
	pub cloak_fake_domain: String,
	pub ca_cert_pem: String,
	pub ca_key: SealedSecret,
}

impl SealedFields for OvcSection {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![("ovc.ca_key", &self.ca_key)]
	}
}

/// Plaintext copy of the brigade IPSec pre-shared key.
///
/// This is the one deliberate exception to "every secret is sealed": the PSK
/// is shared by the whole brigade and must be written into the client config
/// of every user added after the brigade was set up. Keep every read of it
/// visible by going through [`ExposedPsk::expose`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExposedPsk(String);

impl ExposedPsk {
	pub fn new(psk: String) -> Self {
		Self(psk)
	}

	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for ExposedPsk {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ExposedPsk").field(&REDACTED).finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpsecSection {
	pub psk: SealedSecret,
	pub psk_plaintext: ExposedPsk,
}

impl SealedFields for IpsecSection {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![("ipsec.psk", &self.psk)]
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSection {
	pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proto0Section {
	pub fake_domain: String,
	pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WgPeer {
	pub public_key: WgPublicKey,
	pub private_key: SealedSecret,
	pub psk: SealedSecret,
}

impl SealedFields for WgPeer {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![("wg.private_key", &self.private_key), ("wg.psk", &self.psk)]
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvcPeer {
	/// PKCS#10 request the router signs on `peer_add`. Public.
	pub csr_pem: String,
	pub client_key: SealedSecret,
	pub cloak_uid: SealedSecret,
}

impl SealedFields for OvcPeer {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![
			("ovc.client_key", &self.client_key),
			("ovc.cloak_uid", &self.cloak_uid),
		]
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpsecPeer {
	pub username: SealedSecret,
	pub password: SealedSecret,
}

impl SealedFields for IpsecPeer {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![
			("ipsec.username", &self.username),
			("ipsec.password", &self.password),
		]
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlinePeer {
	pub secret: SealedSecret,
}

impl SealedFields for OutlinePeer {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![("outline.secret", &self.secret)]
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proto0Peer {
	pub long_id: SealedSecret,
	pub short_id: SealedSecret,
}

impl SealedFields for Proto0Peer {
	fn sealed_fields(&self) -> Vec<(&'static str, &SealedSecret)> {
		vec![
			("proto0.long_id", &self.long_id),
			("proto0.short_id", &self.short_id),
		]
	}
}
