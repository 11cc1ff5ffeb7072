// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Split-custody sealing for keydesk secrets.
//!
//! Every secret keydesk generates is sealed twice with an anonymous sealed box:
//! once to the router's public key and once to the shuffler's public key. The
//! two ciphertexts are independent full copies; either custodian can open its
//! own copy, and the issuing process cannot open either once the plaintext is
//! dropped.
//!
//! ```
//! use keydesk_seal::{open, SealKeyPair, Sealer};
//!
//! let router = SealKeyPair::generate();
//! let shuffler = SealKeyPair::generate();
//! let sealer = Sealer::new(router.public_key(), shuffler.public_key());
//!
//! let sealed = sealer.seal(b"wg-psk").unwrap();
//! assert!(sealed.is_paired());
//! assert_eq!(open(&sealed.router, router.private_key()).unwrap().expose(), b"wg-psk");
//! assert!(open(&sealed.router, shuffler.private_key()).is_err());
//! ```

pub mod error;
pub mod keys;
pub mod plaintext;
pub mod sealed_box;
pub mod sealer;

pub use error::{Result, SealError};
pub use keys::{SealKeyPair, SealPrivateKey, SealPublicKey};
pub use plaintext::{Plaintext, REDACTED};
pub use sealed_box::{open, seal_to, SEAL_OVERHEAD};
pub use sealer::{Custodian, SealedSecret, Sealer};
