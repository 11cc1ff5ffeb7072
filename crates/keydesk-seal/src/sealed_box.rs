// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Anonymous sealed boxes, byte-compatible with libsodium's
//! `crypto_box_seal`: `ephemeral_public_key (32) || XSalsa20-Poly1305
//! ciphertext`. Any standard sealed-box implementation can open them.

use crypto_box::aead::OsRng;
use crypto_box::{PublicKey, SEALBYTES};
use x25519_dalek::StaticSecret;

use crate::error::{Result, SealError};
use crate::keys::{SealPrivateKey, SealPublicKey};
use crate::plaintext::Plaintext;

/// Bytes added to every plaintext by [`seal_to`].
pub const SEAL_OVERHEAD: usize = SEALBYTES;

fn is_low_order(recipient: &SealPublicKey) -> bool {
	let scratch = StaticSecret::random_from_rng(OsRng);
	let point = x25519_dalek::PublicKey::from(*recipient.as_bytes());
	!scratch.diffie_hellman(&point).was_contributory()
}

/// Seal `plaintext` so that only the holder of `recipient`'s private key can
/// open it. The ciphertext carries no sender identity.
pub fn seal_to(recipient: &SealPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
	if is_low_order(recipient) {
		return Err(SealError::WeakKey);
	}
	PublicKey::from(*recipient.as_bytes())
		.seal(&mut OsRng, plaintext)
		.map_err(|_| SealError::Seal)
}

/// Open a sealed box with a custodian private key.
pub fn open(ciphertext: &[u8], private: &SealPrivateKey) -> Result<Plaintext> {
	if ciphertext.len() < SEAL_OVERHEAD {
		return Err(SealError::Truncated(ciphertext.len()));
	}
	let plaintext = private
		.box_secret()
		.unseal(ciphertext)
		.map_err(|_| SealError::Open)?;
	Ok(Plaintext::new(plaintext))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::keys::SealKeyPair;
	use proptest::prelude::*;

	#[test]
	fn seal_and_open_roundtrip() {
		let pair = SealKeyPair::generate();
		let sealed = seal_to(&pair.public_key(), b"private key material").unwrap();
		assert_eq!(sealed.len(), 20 + SEAL_OVERHEAD);

		let opened = open(&sealed, pair.private_key()).unwrap();
		assert_eq!(opened.expose(), b"private key material");
	}

	#[test]
	fn wrong_key_cannot_open() {
		let alice = SealKeyPair::generate();
		let mallory = SealKeyPair::generate();
		let sealed = seal_to(&alice.public_key(), b"secret").unwrap();
		assert!(matches!(
			open(&sealed, mallory.private_key()),
			Err(SealError::Open)
		));
	}

	#[test]
	fn truncated_ciphertext_is_rejected() {
		let pair = SealKeyPair::generate();
		assert!(matches!(
			open(&[0u8; 10], pair.private_key()),
			Err(SealError::Truncated(10))
		));
	}

	#[test]
	fn low_order_recipient_is_rejected() {
		let zero = SealPublicKey::from_bytes([0u8; 32]);
		assert!(matches!(seal_to(&zero, b"x"), Err(SealError::WeakKey)));
	}

	#[test]
	fn opens_with_a_plain_crypto_box_secret() {
		let pair = SealKeyPair::generate();
		let sealed = seal_to(&pair.public_key(), b"interop").unwrap();
		let secret = crypto_box::SecretKey::from(*pair.private_key().as_bytes());
		assert_eq!(secret.unseal(&sealed).unwrap(), b"interop");
	}

	#[test]
	fn sealing_twice_yields_distinct_ciphertexts() {
		let pair = SealKeyPair::generate();
		let a = seal_to(&pair.public_key(), b"same").unwrap();
		let b = seal_to(&pair.public_key(), b"same").unwrap();
		assert_ne!(a, b);
	}

	proptest! {
		#[test]
		fn prop_seal_open_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..2048)) {
			let pair = SealKeyPair::generate();
			let sealed = seal_to(&pair.public_key(), &plaintext).unwrap();
			let opened = open(&sealed, pair.private_key()).unwrap();
			prop_assert_eq!(opened.expose(), plaintext.as_slice());
		}

		#[test]
		fn prop_tampering_is_detected(
			plaintext in proptest::collection::vec(any::<u8>(), 1..512),
			tamper_idx in 0usize..4096usize,
		) {
			let pair = SealKeyPair::generate();
			let mut sealed = seal_to(&pair.public_key(), &plaintext).unwrap();
			let idx = tamper_idx % sealed.len();
			sealed[idx] ^= 0x01;
			prop_assert!(open(&sealed, pair.private_key()).is_err());
		}
	}
}
