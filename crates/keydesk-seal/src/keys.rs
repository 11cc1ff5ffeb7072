// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::{Result, SealError};

fn decode_32(s: &str) -> Result<[u8; 32]> {
	let bytes = STANDARD.decode(s.trim())?;
	if bytes.len() != 32 {
		return Err(SealError::InvalidKeyLength(bytes.len()));
	}
	let mut arr = [0u8; 32];
	arr.copy_from_slice(&bytes);
	Ok(arr)
}

/// Custodian public key (router or shuffler). Loaded once at startup.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SealPublicKey {
	bytes: [u8; 32],
}

impl SealPublicKey {
	pub fn from_bytes(bytes: [u8; 32]) -> Self {
		Self { bytes }
	}

	pub fn from_base64(s: &str) -> Result<Self> {
		Ok(Self {
			bytes: decode_32(s)?,
		})
	}

	pub fn to_base64(&self) -> String {
		STANDARD.encode(self.bytes)
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.bytes
	}
}

impl fmt::Debug for SealPublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let b64 = self.to_base64();
		write!(f, "SealPublicKey({}...)", &b64[..8])
	}
}

impl fmt::Display for SealPublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_base64())
	}
}

/// Custodian private key. Never present in the live service; used by offline
/// re-keying tools and tests.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SealPrivateKey {
	bytes: [u8; 32],
}

impl SealPrivateKey {
	pub fn generate() -> Self {
		let secret = StaticSecret::random_from_rng(OsRng);
		Self {
			bytes: secret.to_bytes(),
		}
	}

	pub fn from_bytes(bytes: [u8; 32]) -> Self {
		Self { bytes }
	}

	pub fn from_base64(s: &str) -> Result<Self> {
		Ok(Self {
			bytes: decode_32(s)?,
		})
	}

	pub fn public_key(&self) -> SealPublicKey {
		let secret = StaticSecret::from(self.bytes);
		SealPublicKey {
			bytes: *PublicKey::from(&secret).as_bytes(),
		}
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.bytes
	}

	pub(crate) fn box_secret(&self) -> crypto_box::SecretKey {
		crypto_box::SecretKey::from(self.bytes)
	}
}

impl fmt::Debug for SealPrivateKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SealPrivateKey")
			.field("bytes", &crate::REDACTED)
			.finish()
	}
}

#[derive(Clone, Debug)]
pub struct SealKeyPair {
	private: SealPrivateKey,
	public: SealPublicKey,
}

impl SealKeyPair {
	pub fn generate() -> Self {
		Self::from_private_key(SealPrivateKey::generate())
	}

	pub fn from_private_key(private: SealPrivateKey) -> Self {
		let public = private.public_key();
		Self { private, public }
	}

	pub fn private_key(&self) -> &SealPrivateKey {
		&self.private
	}

	pub fn public_key(&self) -> SealPublicKey {
		self.public
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn public_key_base64_roundtrip() {
		let pair = SealKeyPair::generate();
		let b64 = pair.public_key().to_base64();
		assert_eq!(b64.len(), 44);
		assert_eq!(SealPublicKey::from_base64(&b64).unwrap(), pair.public_key());
	}

	#[test]
	fn private_key_derives_stable_public_key() {
		let private = SealPrivateKey::generate();
		assert_eq!(private.public_key(), private.public_key());
	}

	#[test]
	fn rejects_short_key() {
		let short = STANDARD.encode([1u8; 16]);
		assert!(matches!(
			SealPublicKey::from_base64(&short),
			Err(SealError::InvalidKeyLength(16))
		));
	}

	#[test]
	fn private_key_debug_is_redacted() {
		let private = SealPrivateKey::generate();
		assert!(format!("{private:?}").contains("[REDACTED]"));
	}
}
