// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Brigade-level protocol sections: switching a protocol on, and rerolling
//! the camouflage domain or port of an enabled one.

use keydesk_model::{Brigade, Protocol};
use keydesk_seal::Sealer;
use rand::seq::SliceRandom;
use tracing::{info, instrument};

use crate::error::{ProtocolError, Result};
use crate::{ipsec, outline, ovc, proto0};

/// Domains the obfuscated protocols may impersonate.
#[derive(Debug, Clone, Default)]
pub struct DomainPool {
	domains: Vec<String>,
}

impl DomainPool {
	pub fn new(domains: Vec<String>) -> Self {
		Self { domains }
	}

	pub fn is_empty(&self) -> bool {
		self.domains.is_empty()
	}

	pub fn pick(&self) -> Result<String> {
		self
			.domains
			.choose(&mut rand::thread_rng())
			.cloned()
			.ok_or(ProtocolError::NoFakeDomains)
	}

	/// Like [`DomainPool::pick`] but avoids `current` when there is a choice.
	pub fn pick_other(&self, current: &str) -> Result<String> {
		let others: Vec<&String> = self.domains.iter().filter(|d| *d != current).collect();
		match others.choose(&mut rand::thread_rng()) {
			Some(domain) => Ok((*domain).clone()),
			None => self.pick(),
		}
	}
}

/// Create the brigade section for `protocol`. User sections are not touched;
/// the caller generates those afterwards.
#[instrument(skip(sealer, brigade, domains), fields(brigade_id = %brigade.brigade_id))]
pub fn enable(
	sealer: &Sealer,
	brigade: &mut Brigade,
	protocol: Protocol,
	domains: &DomainPool,
) -> Result<()> {
	if brigade.is_enabled(protocol) {
		return Err(ProtocolError::AlreadyEnabled(protocol));
	}

	match protocol {
		Protocol::WireGuard => return Err(ProtocolError::AlreadyEnabled(protocol)),
		Protocol::Ovc => brigade.ovc = Some(ovc::new_section(sealer, domains.pick()?)?),
		Protocol::Ipsec => brigade.ipsec = Some(ipsec::new_section(sealer)?),
		Protocol::Outline => brigade.outline = Some(outline::new_section(brigade)?),
		Protocol::Proto0 => brigade.proto0 = Some(proto0::new_section(brigade, domains.pick()?)?),
	}
	info!(%protocol, "protocol section created");
	Ok(())
}

/// Give an enabled protocol a new camouflage domain (OVC, Proto0).
pub fn reset_domain(brigade: &mut Brigade, protocol: Protocol, domains: &DomainPool) -> Result<String> {
	match protocol {
		Protocol::Ovc => {
			let section = brigade.ovc.as_mut().ok_or(ProtocolError::NotEnabled(protocol))?;
			section.cloak_fake_domain = domains.pick_other(&section.cloak_fake_domain)?;
			Ok(section.cloak_fake_domain.clone())
		}
		Protocol::Proto0 => {
			let section = brigade.proto0.as_mut().ok_or(ProtocolError::NotEnabled(protocol))?;
			section.fake_domain = domains.pick_other(&section.fake_domain)?;
			Ok(section.fake_domain.clone())
		}
		other => Err(ProtocolError::NotEnabled(other)),
	}
}

/// Give an enabled protocol a new listening port (Outline, Proto0).
pub fn reset_port(brigade: &mut Brigade, protocol: Protocol) -> Result<u16> {
	match protocol {
		Protocol::Outline => {
			let current = brigade
				.outline
				.as_ref()
				.ok_or(ProtocolError::NotEnabled(protocol))?
				.port;
			let mut taken = vec![brigade.endpoint_port, current];
			taken.extend(brigade.proto0.as_ref().map(|p| p.port));
			let port = crate::random::port(outline::PORT_RANGE, &taken)
				.ok_or(ProtocolError::NoFreePort(protocol))?;
			if let Some(section) = brigade.outline.as_mut() {
				section.port = port;
			}
			Ok(port)
		}
		Protocol::Proto0 => {
			let current = brigade
				.proto0
				.as_ref()
				.ok_or(ProtocolError::NotEnabled(protocol))?
				.port;
			let mut taken = proto0::taken_ports(brigade);
			taken.push(current);
			let port = crate::random::port(proto0::PORT_RANGE, &taken)
				.ok_or(ProtocolError::NoFreePort(protocol))?;
			if let Some(section) = brigade.proto0.as_mut() {
				section.port = port;
			}
			Ok(port)
		}
		other => Err(ProtocolError::NotEnabled(other)),
	}
}
