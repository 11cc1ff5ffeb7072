// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Random address assignment inside a brigade prefix.
//!
//! Addresses are drawn uniformly from the host part of the prefix and retried
//! on collision. The network and all-ones addresses are always treated as
//! used. Before sampling, the free capacity is counted so an exhausted prefix
//! fails with [`AllocError::Exhausted`] instead of looping.

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use rand::Rng;
use tracing::{instrument, trace};

use crate::error::{AllocError, Result};

pub fn new_ipv4(prefix: Ipv4Net, used: &HashSet<Ipv4Addr>) -> Result<Ipv4Addr> {
	new_ipv4_with_rng(&mut rand::thread_rng(), prefix, used)
}

pub fn new_ipv6(prefix: Ipv6Net, used: &HashSet<Ipv6Addr>) -> Result<Ipv6Addr> {
	new_ipv6_with_rng(&mut rand::thread_rng(), prefix, used)
}

#[instrument(skip(rng, used), fields(%prefix, used = used.len()))]
pub fn new_ipv4_with_rng<R: Rng + ?Sized>(
	rng: &mut R,
	prefix: Ipv4Net,
	used: &HashSet<Ipv4Addr>,
) -> Result<Ipv4Addr> {
	let network = prefix.network();
	let broadcast = prefix.broadcast();
	let taken_in_prefix = used
		.iter()
		.filter(|a| prefix.contains(*a) && **a != network && **a != broadcast)
		.count() as u64;
	let size = 1u64 << (32 - u32::from(prefix.prefix_len()));
	let capacity = size.saturating_sub(2);

	if capacity <= taken_in_prefix {
		return Err(AllocError::Exhausted {
			prefix: prefix.to_string(),
		});
	}

	let base = u32::from(network);
	let mut attempts = 0u32;
	loop {
		attempts += 1;
		let host = rng.gen_range(0..size) as u32;
		let addr = Ipv4Addr::from(base | host);
		if addr != network && addr != broadcast && !used.contains(&addr) {
			trace!(%addr, attempts, "allocated ipv4 address");
			return Ok(addr);
		}
	}
}

#[instrument(skip(rng, used), fields(%prefix, used = used.len()))]
pub fn new_ipv6_with_rng<R: Rng + ?Sized>(
	rng: &mut R,
	prefix: Ipv6Net,
	used: &HashSet<Ipv6Addr>,
) -> Result<Ipv6Addr> {
	let network = prefix.network();
	let broadcast = prefix.broadcast();
	let taken_in_prefix = used
		.iter()
		.filter(|a| prefix.contains(*a) && **a != network && **a != broadcast)
		.count() as u128;
	let host_bits = 128 - u32::from(prefix.prefix_len());
	let host_mask = if host_bits == 128 {
		u128::MAX
	} else {
		(1u128 << host_bits) - 1
	};
	let capacity = host_mask.saturating_sub(1);

	if capacity <= taken_in_prefix {
		return Err(AllocError::Exhausted {
			prefix: prefix.to_string(),
		});
	}

	let base = u128::from(network);
	let mut attempts = 0u32;
	loop {
		attempts += 1;
		let host = rng.gen::<u128>() & host_mask;
		let addr = Ipv6Addr::from(base | host);
		if addr != network && addr != broadcast && !used.contains(&addr) {
			trace!(%addr, attempts, "allocated ipv6 address");
			return Ok(addr);
		}
	}
}
