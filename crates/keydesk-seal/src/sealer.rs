// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::keys::{SealPrivateKey, SealPublicKey};
use crate::plaintext::Plaintext;
use crate::sealed_box::{open, seal_to};

/// The two independent holders of sealed copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Custodian {
	Router,
	Shuffler,
}

/// One secret sealed to both custodians.
///
/// This is the only shape in which secret material is persisted. A value with
/// one empty half is a broken record; see [`SealedSecret::is_paired`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
	#[serde(with = "base64_bytes")]
	pub router: Vec<u8>,
	#[serde(with = "base64_bytes")]
	pub shuffler: Vec<u8>,
}

impl SealedSecret {
	pub fn is_paired(&self) -> bool {
		!self.router.is_empty() && !self.shuffler.is_empty()
	}

	pub fn ciphertext(&self, custodian: Custodian) -> &[u8] {
		match custodian {
			Custodian::Router => &self.router,
			Custodian::Shuffler => &self.shuffler,
		}
	}

	/// Router copy in the encoding the gateway expects.
	pub fn router_base64(&self) -> String {
		STANDARD.encode(&self.router)
	}

	pub fn open(&self, custodian: Custodian, private: &SealPrivateKey) -> Result<Plaintext> {
		open(self.ciphertext(custodian), private)
	}
}

impl fmt::Debug for SealedSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SealedSecret")
			.field("router_len", &self.router.len())
			.field("shuffler_len", &self.shuffler.len())
			.finish()
	}
}

/// Seals secrets to the router and shuffler public keys.
///
/// Both keys are read-only configuration; one `Sealer` is built at startup
/// and shared by every generator.
#[derive(Debug, Clone)]
pub struct Sealer {
	router: SealPublicKey,
	shuffler: SealPublicKey,
}

impl Sealer {
	pub fn new(router: SealPublicKey, shuffler: SealPublicKey) -> Self {
		Self { router, shuffler }
	}

	pub fn router_key(&self) -> &SealPublicKey {
		&self.router
	}

	pub fn shuffler_key(&self) -> &SealPublicKey {
		&self.shuffler
	}

	pub fn seal(&self, plaintext: &[u8]) -> Result<SealedSecret> {
		Ok(SealedSecret {
			router: seal_to(&self.router, plaintext)?,
			shuffler: seal_to(&self.shuffler, plaintext)?,
		})
	}

	pub fn seal_plaintext(&self, plaintext: &Plaintext) -> Result<SealedSecret> {
		self.seal(plaintext.expose())
	}
}

mod base64_bytes {
	use super::*;

	pub fn serialize<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&STANDARD.encode(bytes))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		STANDARD.decode(s).map_err(serde::de::Error::custom)
	}
}
