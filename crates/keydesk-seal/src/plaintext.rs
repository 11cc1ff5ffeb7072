// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting holder for secret plaintext.
//!
//! Plaintext only lives in memory between generation and sealing (or between
//! opening and use in offline tools). It never prints, never serializes, and
//! is zeroized on drop. Reading it requires an explicit `.expose()`.

use std::borrow::Cow;
use std::fmt;

use zeroize::Zeroize;

use crate::error::{Result, SealError};

/// The placeholder printed instead of any secret value.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Plaintext {
	bytes: Vec<u8>,
}

impl Plaintext {
	pub fn new(bytes: Vec<u8>) -> Self {
		Self { bytes }
	}

	pub fn expose(&self) -> &[u8] {
		&self.bytes
	}

	/// Borrow the plaintext as text. Generated secrets that end up in client
	/// configs (passwords, base64 keys) are always ASCII.
	pub fn expose_str(&self) -> Result<&str> {
		std::str::from_utf8(&self.bytes).map_err(|_| SealError::NotUtf8)
	}

	/// Text form for rendering into client configs; invalid UTF-8 is
	/// replaced rather than rejected.
	pub fn expose_text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.bytes)
	}

	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}
}

impl From<String> for Plaintext {
	fn from(value: String) -> Self {
		Self::new(value.into_bytes())
	}
}

impl From<&str> for Plaintext {
	fn from(value: &str) -> Self {
		Self::new(value.as_bytes().to_vec())
	}
}

impl From<Vec<u8>> for Plaintext {
	fn from(value: Vec<u8>) -> Self {
		Self::new(value)
	}
}

impl Clone for Plaintext {
	fn clone(&self) -> Self {
		Self::new(self.bytes.clone())
	}
}

impl PartialEq for Plaintext {
	fn eq(&self, other: &Self) -> bool {
		self.bytes == other.bytes
	}
}

impl Eq for Plaintext {}

impl fmt::Debug for Plaintext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Plaintext").field(&REDACTED).finish()
	}
}

impl fmt::Display for Plaintext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let p = Plaintext::from("hunter2");
		assert_eq!(format!("{p:?}"), "Plaintext(\"[REDACTED]\")");
		assert_eq!(format!("{p}"), REDACTED);
	}

	#[test]
	fn expose_returns_inner_bytes() {
		let p = Plaintext::from("hunter2");
		assert_eq!(p.expose(), b"hunter2");
		assert_eq!(p.expose_str().unwrap(), "hunter2");
		assert_eq!(p.len(), 7);
	}

	#[test]
	fn expose_str_rejects_binary() {
		let p = Plaintext::new(vec![0xff, 0xfe]);
		assert!(matches!(p.expose_str(), Err(SealError::NotUtf8)));
	}
}
