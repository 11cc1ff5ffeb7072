// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Address obfuscation for user-visible tags.
//!
//! A user's name carries a short number derived from its IPv4 address so
//! brigadiers can tell peers apart, without revealing the address itself.

use std::net::Ipv4Addr;

use keydesk_model::BrigadeId;

/// Per-brigade XOR key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt(pub u32);

impl Salt {
	/// Bytes 2, 5, 9 and 14 of the decoded brigade id, big-endian.
	pub fn from_brigade_id(id: &BrigadeId) -> Self {
		let b = id.as_bytes();
		Self(u32::from_be_bytes([b[2], b[5], b[9], b[14]]))
	}
}

/// XOR the address with the salt and keep only the host bits.
pub fn blur(addr: Ipv4Addr, prefix_bits: u8, salt: Salt) -> u32 {
	let host_mask = match prefix_bits {
		0 => u32::MAX,
		32.. => 0,
		n => u32::MAX >> n,
	};
	(u32::from(addr) ^ salt.0) & host_mask
}

#[cfg(test)]
mod tests {
	use super::*;
	use uuid::Uuid;

	#[test]
	fn salt_picks_fixed_bytes() {
		let mut bytes = [0u8; 16];
		bytes[2] = 0x11;
		bytes[5] = 0x22;
		bytes[9] = 0x33;
		bytes[14] = 0x44;
		let id = BrigadeId::from_uuid(Uuid::from_bytes(bytes));
		assert_eq!(Salt::from_brigade_id(&id), Salt(0x1122_3344));
	}

	#[test]
	fn blur_keeps_host_bits_only() {
		let salt = Salt(0xFFFF_FF0F);
		let addr = Ipv4Addr::new(100, 64, 0, 0x25);
		assert_eq!(blur(addr, 24, salt), 0x2A);
		assert_eq!(blur(addr, 32, salt), 0);
	}

	#[test]
	fn blur_is_injective_within_prefix() {
		let salt = Salt(0xDEAD_BEEF);
		let tags: std::collections::HashSet<u32> = (1..255u8)
			.map(|h| blur(Ipv4Addr::new(100, 64, 0, h), 24, salt))
			.collect();
		assert_eq!(tags.len(), 254);
	}
}
