// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collision-free identities and addresses for brigade users.
//!
//! [`allocate_user`] is what callers normally use: it draws a user id, one
//! IPv4 and one IPv6 address not yet used in the brigade, and a tagged name.

pub mod addr;
pub mod blur;
pub mod error;
pub mod names;

use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};

use keydesk_model::{Brigade, UserId};
use tracing::instrument;
use uuid::Uuid;

pub use addr::{new_ipv4, new_ipv4_with_rng, new_ipv6, new_ipv6_with_rng};
pub use blur::{blur, Salt};
pub use error::{AllocError, Result};
pub use names::{tagged_name, unique_pseudonym, NameSource, SimpleNames};

pub fn new_user_id(existing: &HashSet<UserId>) -> UserId {
	loop {
		let id = Uuid::new_v4();
		if !existing.contains(&id) {
			return id;
		}
	}
}

/// Identity and addresses reserved for one new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSlot {
	pub user_id: UserId,
	pub ipv4_addr: Ipv4Addr,
	pub ipv6_addr: Ipv6Addr,
	pub name: String,
}

#[instrument(skip(brigade, names), fields(brigade_id = %brigade.brigade_id))]
pub fn allocate_user(brigade: &Brigade, names: &dyn NameSource) -> Result<UserSlot> {
	let ipv4_addr = new_ipv4(brigade.ipv4_cgnat, &brigade.used_ipv4())?;
	let ipv6_addr = new_ipv6(brigade.ipv6_ula, &brigade.used_ipv6())?;
	let user_id = new_user_id(&brigade.user_ids());

	let salt = Salt::from_brigade_id(&brigade.brigade_id);
	let tag = blur(ipv4_addr, brigade.ipv4_cgnat.prefix_len(), salt);
	let taken: HashSet<String> = brigade
		.users
		.iter()
		.filter_map(|u| u.name.split_once(' ').map(|(_, rest)| rest.to_string()))
		.collect();
	let name = tagged_name(tag, &unique_pseudonym(names, &taken));

	Ok(UserSlot {
		user_id,
		ipv4_addr,
		ipv6_addr,
		name,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_model::testing::{sample_brigade, sample_user, test_sealer};

	#[test]
	fn new_user_id_avoids_existing() {
		let mut existing = HashSet::new();
		for _ in 0..100 {
			let id = new_user_id(&existing);
			assert!(existing.insert(id));
		}
	}

	#[test]
	fn three_users_in_slash_24_get_distinct_host_addresses() {
		let sealer = test_sealer();
		let mut brigade = sample_brigade(&sealer, 0);
		brigade.ipv4_cgnat = "100.64.0.0/24".parse().unwrap();

		for i in 0..3u8 {
			let slot = allocate_user(&brigade, &SimpleNames).unwrap();
			let mut user = sample_user(&sealer, &brigade, i, i == 0);
			user.user_id = slot.user_id;
			user.ipv4_addr = slot.ipv4_addr;
			user.ipv6_addr = slot.ipv6_addr;
			user.name = slot.name;
			brigade.users.push(user);
		}

		let addrs: HashSet<Ipv4Addr> = brigade.users.iter().map(|u| u.ipv4_addr).collect();
		assert_eq!(addrs.len(), 3);
		for addr in &addrs {
			assert!(brigade.ipv4_cgnat.contains(addr));
			assert_ne!(*addr, Ipv4Addr::new(100, 64, 0, 0));
			assert_ne!(*addr, Ipv4Addr::new(100, 64, 0, 255));
		}
		assert_eq!(brigade.validate(250), Ok(()));
	}

	#[test]
	fn name_starts_with_blurred_tag() {
		let sealer = test_sealer();
		let brigade = sample_brigade(&sealer, 1);
		let slot = allocate_user(&brigade, &SimpleNames).unwrap();
		let salt = Salt::from_brigade_id(&brigade.brigade_id);
		let tag = blur(slot.ipv4_addr, 24, salt);
		assert!(slot.name.starts_with(&format!("{tag:03} ")));
	}
}
