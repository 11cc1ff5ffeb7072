// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::ModelError;

pub type UserId = Uuid;

/// 128-bit brigade identifier, printed as unpadded base32 (26 characters).
///
/// The base32 form is used for directory names, CLI arguments and the
/// serialized record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BrigadeId(Uuid);

impl BrigadeId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}

	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}

	pub fn as_bytes(&self) -> &[u8; 16] {
		self.0.as_bytes()
	}
}

impl Default for BrigadeId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for BrigadeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&BASE32_NOPAD.encode(self.0.as_bytes()))
	}
}

impl fmt::Debug for BrigadeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "BrigadeId({self})")
	}
}

impl FromStr for BrigadeId {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = BASE32_NOPAD
			.decode(s.to_ascii_uppercase().as_bytes())
			.map_err(|_| ModelError::InvalidBrigadeId(s.to_string()))?;
		let arr: [u8; 16] = bytes
			.try_into()
			.map_err(|_| ModelError::InvalidBrigadeId(s.to_string()))?;
		Ok(Self(Uuid::from_bytes(arr)))
	}
}

impl Serialize for BrigadeId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for BrigadeId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_is_26_char_base32() {
		let id = BrigadeId::new();
		let s = id.to_string();
		assert_eq!(s.len(), 26);
		assert!(s
			.chars()
			.all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
	}

	#[test]
	fn parse_roundtrip() {
		let id = BrigadeId::new();
		assert_eq!(id.to_string().parse::<BrigadeId>().unwrap(), id);
	}

	#[test]
	fn parse_accepts_lowercase() {
		let id = BrigadeId::new();
		let lower = id.to_string().to_lowercase();
		assert_eq!(lower.parse::<BrigadeId>().unwrap(), id);
	}

	#[test]
	fn parse_rejects_wrong_length() {
		assert!("MFRGG".parse::<BrigadeId>().is_err());
		assert!("not base32!".parse::<BrigadeId>().is_err());
	}

	#[test]
	fn serde_uses_base32_string() {
		let id = BrigadeId::new();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{id}\""));
		let back: BrigadeId = serde_json::from_str(&json).unwrap();
		assert_eq!(back, id);
	}
}
