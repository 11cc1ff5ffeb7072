// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

pub(crate) fn bytes<const N: usize>() -> [u8; N] {
	let mut buf = [0u8; N];
	OsRng.fill_bytes(&mut buf);
	buf
}

pub(crate) fn alphanumeric(len: usize) -> String {
	OsRng
		.sample_iter(&Alphanumeric)
		.take(len)
		.map(char::from)
		.collect()
}

/// Uniform port in `range`, skipping `taken`. `None` when every port is taken.
pub(crate) fn port(range: std::ops::RangeInclusive<u16>, taken: &[u16]) -> Option<u16> {
	let free = range
		.clone()
		.filter(|p| !taken.contains(p))
		.count();
	if free == 0 {
		return None;
	}
	let pick = OsRng.gen_range(0..free);
	range.filter(|p| !taken.contains(p)).nth(pick)
}
