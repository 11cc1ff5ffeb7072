// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::net::{Ipv4Addr, Ipv6Addr};

use keydesk_model::{Brigade, Protocol, UserId};
use keydesk_seal::Sealer;

use crate::error::Result;
use crate::params::GatewayParams;

/// Everything about a new user that was decided before credentials exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSeed {
	pub user_id: UserId,
	pub name: String,
	pub ipv4_addr: Ipv4Addr,
	pub ipv6_addr: Ipv6Addr,
	pub is_brigadier: bool,
}

/// Output of one generator run.
///
/// `client` goes to the end user and is never persisted. `params` is this
/// protocol's share of the `peer_add` call. `persisted` is the sealed
/// material stored on the user record.
#[derive(Debug)]
pub struct Generated<C, P> {
	pub client: C,
	pub params: GatewayParams,
	pub persisted: P,
}

pub trait ProtocolGenerator {
	type Client;
	type Persisted;

	const PROTOCOL: Protocol;

	fn generate(
		&self,
		sealer: &Sealer,
		brigade: &Brigade,
		seed: &UserSeed,
	) -> Result<Generated<Self::Client, Self::Persisted>>;
}
