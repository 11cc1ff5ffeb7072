// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Composite generation for a whole user across every enabled protocol.

use chrono::Utc;
use keydesk_model::{Brigade, Protocol, User, UserQuota};
use keydesk_seal::Sealer;
use tracing::{debug, instrument};

use crate::bundle::ClientBundle;
use crate::error::Result;
use crate::generator::{ProtocolGenerator, UserSeed};
use crate::ipsec::Ipsec;
use crate::outline::Outline;
use crate::ovc::Ovc;
use crate::params::{GatewayParams, CONTROL_HOST};
use crate::proto0::Proto0;
use crate::wireguard::WireGuard;

impl From<&User> for UserSeed {
	fn from(user: &User) -> Self {
		Self {
			user_id: user.user_id,
			name: user.name.clone(),
			ipv4_addr: user.ipv4_addr,
			ipv6_addr: user.ipv6_addr,
			is_brigadier: user.is_brigadier,
		}
	}
}

/// A user record ready to store, its client bundle, and the full `peer_add`
/// parameters.
#[derive(Debug)]
pub struct GeneratedUser {
	pub user: User,
	pub bundle: ClientBundle,
	pub params: GatewayParams,
}

/// Run every generator the brigade has enabled. Any failure aborts the whole
/// user; nothing partial is returned.
#[instrument(skip_all, fields(brigade_id = %brigade.brigade_id, user_id = %seed.user_id))]
pub fn generate_user(sealer: &Sealer, brigade: &Brigade, seed: &UserSeed) -> Result<GeneratedUser> {
	let wg = WireGuard.generate(sealer, brigade, seed)?;
	let mut params = wg.params;
	if seed.is_brigadier {
		params.insert(CONTROL_HOST, brigade.keydesk_ipv6.to_string());
	}

	let mut user = User {
		user_id: seed.user_id,
		name: seed.name.clone(),
		created_at: Utc::now(),
		is_brigadier: seed.is_brigadier,
		ipv4_addr: seed.ipv4_addr,
		ipv6_addr: seed.ipv6_addr,
		wg: wg.persisted,
		ovc: None,
		ipsec: None,
		outline: None,
		proto0: None,
		is_blocked: false,
		pending: None,
		quota: UserQuota::default(),
	};
	let mut bundle = ClientBundle {
		user_id: seed.user_id,
		name: seed.name.clone(),
		wg: wg.client,
		ovc: None,
		ipsec: None,
		outline: None,
		proto0: None,
	};

	for protocol in Protocol::OPTIONAL {
		if brigade.is_enabled(protocol) {
			let share = generate_section(sealer, brigade, seed, protocol, &mut user, &mut bundle)?;
			params.extend(share);
		}
	}

	debug!(protocols = ?user.protocols(), "user credentials generated");
	Ok(GeneratedUser {
		user,
		bundle,
		params,
	})
}

/// New secrets for an existing user; identity, addresses, name and counters
/// are kept.
pub fn regenerate_user(sealer: &Sealer, brigade: &Brigade, existing: &User) -> Result<GeneratedUser> {
	let mut out = generate_user(sealer, brigade, &UserSeed::from(existing))?;
	out.user.created_at = existing.created_at;
	out.user.quota = existing.quota.clone();
	out.user.is_blocked = existing.is_blocked;
	Ok(out)
}

/// Generate one optional protocol's material into `user` and `bundle`,
/// returning that protocol's share of the `peer_add` parameters.
pub fn generate_section(
	sealer: &Sealer,
	brigade: &Brigade,
	seed: &UserSeed,
	protocol: Protocol,
	user: &mut User,
	bundle: &mut ClientBundle,
) -> Result<GatewayParams> {
	let params = match protocol {
		Protocol::WireGuard => GatewayParams::new(),
		Protocol::Ovc => {
			let out = Ovc.generate(sealer, brigade, seed)?;
			user.ovc = Some(out.persisted);
			bundle.ovc = Some(out.client);
			out.params
		}
		Protocol::Ipsec => {
			let out = Ipsec.generate(sealer, brigade, seed)?;
			user.ipsec = Some(out.persisted);
			bundle.ipsec = Some(out.client);
			out.params
		}
		Protocol::Outline => {
			let out = Outline.generate(sealer, brigade, seed)?;
			user.outline = Some(out.persisted);
			bundle.outline = Some(out.client);
			out.params
		}
		Protocol::Proto0 => {
			let out = Proto0.generate(sealer, brigade, seed)?;
			user.proto0 = Some(out.persisted);
			bundle.proto0 = Some(out.client);
			out.params
		}
	};
	Ok(params)
}

/// Give an existing user material for a protocol that was just enabled on
/// its brigade. Client configs are not kept; a rotation hands them out.
pub fn extend_user(sealer: &Sealer, brigade: &Brigade, protocol: Protocol, user: &mut User) -> Result<()> {
	let seed = UserSeed::from(&*user);
	match protocol {
		Protocol::WireGuard => {}
		Protocol::Ovc => user.ovc = Some(Ovc.generate(sealer, brigade, &seed)?.persisted),
		Protocol::Ipsec => user.ipsec = Some(Ipsec.generate(sealer, brigade, &seed)?.persisted),
		Protocol::Outline => user.outline = Some(Outline.generate(sealer, brigade, &seed)?.persisted),
		Protocol::Proto0 => user.proto0 = Some(Proto0.generate(sealer, brigade, &seed)?.persisted),
	}
	Ok(())
}
