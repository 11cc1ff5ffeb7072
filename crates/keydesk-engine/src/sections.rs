// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Protocol switches and camouflage rerolls on an existing brigade. Each one
//! commits the new record and then rebuilds the brigade on the gateway.

use keydesk_model::{BrigadeId, Protocol};
use keydesk_protocols::{enable, extend_user};
use tracing::{info, instrument};

use crate::error::{KeydeskError, Result};
use crate::keydesk::Keydesk;
use crate::replay::ReplayReport;

impl Keydesk {
	/// Create the brigade section for `protocol` and every user's material
	/// for it.
	#[instrument(skip(self), fields(brigade_id = %id, %protocol))]
	pub async fn enable_protocol(&self, id: &BrigadeId, protocol: Protocol) -> Result<ReplayReport> {
		let (txn, mut brigade) = self.store.open_for_modify(id)?;
		enable(&self.sealer, &mut brigade, protocol, &self.domains)?;

		let context = brigade.clone();
		for user in &mut brigade.users {
			extend_user(&self.sealer, &context, protocol, user)?;
		}
		brigade.validate(self.store.max_users())?;

		info!(users = brigade.users.len(), "protocol enabled");
		self.commit_and_replay(txn, &brigade).await
	}

	#[instrument(skip(self), fields(brigade_id = %id, %protocol))]
	pub async fn disable_protocol(&self, id: &BrigadeId, protocol: Protocol) -> Result<ReplayReport> {
		if protocol == Protocol::WireGuard {
			return Err(KeydeskError::ProtocolRequired(protocol));
		}
		let (txn, mut brigade) = self.store.open_for_modify(id)?;
		if !brigade.is_enabled(protocol) {
			return Err(keydesk_protocols::ProtocolError::NotEnabled(protocol).into());
		}
		brigade.drop_protocol(protocol);

		info!("protocol disabled");
		self.commit_and_replay(txn, &brigade).await
	}

	/// New camouflage domain for OVC or Proto0.
	#[instrument(skip(self), fields(brigade_id = %id, %protocol))]
	pub async fn reset_domain(
		&self,
		id: &BrigadeId,
		protocol: Protocol,
	) -> Result<(String, ReplayReport)> {
		let (txn, mut brigade) = self.store.open_for_modify(id)?;
		let domain = keydesk_protocols::reset_domain(&mut brigade, protocol, &self.domains)?;
		info!(%domain, "domain reset");
		let report = self.commit_and_replay(txn, &brigade).await?;
		Ok((domain, report))
	}

	/// New listening port for Outline or Proto0.
	#[instrument(skip(self), fields(brigade_id = %id, %protocol))]
	pub async fn reset_port(&self, id: &BrigadeId, protocol: Protocol) -> Result<(u16, ReplayReport)> {
		let (txn, mut brigade) = self.store.open_for_modify(id)?;
		let port = keydesk_protocols::reset_port(&mut brigade, protocol)?;
		info!(port, "port reset");
		let report = self.commit_and_replay(txn, &brigade).await?;
		Ok((port, report))
	}
}
