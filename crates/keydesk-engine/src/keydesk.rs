// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ipnet::{Ipv4Net, Ipv6Net};
use keydesk_alloc::{allocate_user, NameSource, SimpleNames};
use keydesk_config::KeydeskConfig;
use keydesk_gateway::{Gateway, GatewayError};
use keydesk_model::{
	Brigade, BrigadeId, LastActivity, PendingAction, Protocol, TrafficCounters, UserId,
	RECORD_VERSION,
};
use keydesk_protocols::params::{interface_params, wg_del_params};
use keydesk_protocols::{enable, generate_user, new_interface_keys, ClientBundle, DomainPool, UserSeed};
use keydesk_reconcile::{reconcile, Reconciliation};
use keydesk_seal::Sealer;
use keydesk_store::RecordStore;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::patch::{apply_patch, PatchSummary};
use crate::replay::{replay, ReplayOptions, ReplayReport};

/// Owns everything an operation needs: the record store, the sealer built
/// from the custodian keys, the gateway and the allocation sources.
pub struct Keydesk {
	pub(crate) store: RecordStore,
	pub(crate) sealer: Sealer,
	pub(crate) gateway: Arc<dyn Gateway>,
	pub(crate) domains: DomainPool,
	pub(crate) names: Arc<dyn NameSource>,
}

/// Parameters of a new brigade.
#[derive(Debug, Clone)]
pub struct NewBrigade {
	pub brigade_id: BrigadeId,
	pub endpoint_ipv4: Ipv4Addr,
	pub endpoint_domain: Option<String>,
	pub endpoint_port: u16,
	pub dns_v4: Ipv4Addr,
	pub dns_v6: Ipv6Addr,
	pub ipv4_cgnat: Ipv4Net,
	pub ipv6_ula: Ipv6Net,
	pub keydesk_ipv6: Ipv6Addr,
	/// Optional protocols to switch on; WireGuard is always on.
	pub protocols: Vec<Protocol>,
	pub brigadier_name: Option<String>,
	pub vip: bool,
}

/// A user just created or rotated, with the client configs to hand out.
#[derive(Debug, Clone)]
pub struct IssuedUser {
	pub brigade_id: BrigadeId,
	pub user_id: UserId,
	pub name: String,
	pub bundle: ClientBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
	pub user_id: UserId,
	pub name: String,
	pub created_at: DateTime<Utc>,
	pub is_brigadier: bool,
	pub is_blocked: bool,
	pub ipv4_addr: Ipv4Addr,
	pub ipv6_addr: Ipv6Addr,
	pub protocols: Vec<Protocol>,
	pub traffic: TrafficCounters,
	pub last_activity: LastActivity,
}

/// Result of [`Keydesk::patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
	Applied(PatchSummary),
	/// Brigade-level fields differ and `force` was not given; nothing changed.
	FullReplayRequired { changed: Vec<&'static str> },
	/// Brigade-level fields differed and the fresh record was forced in.
	Replaced(ReplayReport),
}

impl Keydesk {
	pub fn new(store: RecordStore, sealer: Sealer, gateway: Arc<dyn Gateway>) -> Self {
		Self {
			store,
			sealer,
			gateway,
			domains: DomainPool::default(),
			names: Arc::new(SimpleNames),
		}
	}

	pub fn from_config(config: &KeydeskConfig, gateway: Arc<dyn Gateway>) -> Self {
		Self::new(
			RecordStore::new(&config.storage.dir, config.limits.max_users),
			config.keys.sealer(),
			gateway,
		)
		.with_domains(DomainPool::new(config.domains.fake_domains.clone()))
	}

	pub fn with_domains(mut self, domains: DomainPool) -> Self {
		self.domains = domains;
		self
	}

	pub fn with_names(mut self, names: Arc<dyn NameSource>) -> Self {
		self.names = names;
		self
	}

	pub fn store(&self) -> &RecordStore {
		&self.store
	}

	pub fn gateway(&self) -> &dyn Gateway {
		self.gateway.as_ref()
	}

	/// Create the brigade record, its interface on the gateway and its
	/// brigadier. Nothing is stored unless every gateway call succeeds, and an
	/// interface added before a failed brigadier push is deleted again.
	#[instrument(skip(self, request), fields(brigade_id = %request.brigade_id))]
	pub async fn create_brigade(&self, request: NewBrigade) -> Result<IssuedUser> {
		let mut txn = self.store.open_for_create(&request.brigade_id)?;

		let (wg_public_key, wg_private) = new_interface_keys(&self.sealer)?;
		let mut brigade = Brigade {
			version: RECORD_VERSION,
			brigade_id: request.brigade_id,
			created_at: Utc::now(),
			endpoint_ipv4: request.endpoint_ipv4,
			endpoint_domain: request.endpoint_domain,
			endpoint_port: request.endpoint_port,
			dns_v4: request.dns_v4,
			dns_v6: request.dns_v6,
			ipv4_cgnat: request.ipv4_cgnat,
			ipv6_ula: request.ipv6_ula,
			keydesk_ipv6: request.keydesk_ipv6,
			wg_public_key,
			wg_private,
			ovc: None,
			ipsec: None,
			outline: None,
			proto0: None,
			users: Vec::new(),
			messages: Vec::new(),
			subscription: None,
			vip: request.vip,
			counters: TrafficCounters::default(),
			keydesk_last_visit: None,
		};
		for protocol in request.protocols {
			if protocol != Protocol::WireGuard && !brigade.is_enabled(protocol) {
				enable(&self.sealer, &mut brigade, protocol, &self.domains)?;
			}
		}

		let slot = allocate_user(&brigade, self.names.as_ref())?;
		let seed = UserSeed {
			user_id: slot.user_id,
			name: request.brigadier_name.unwrap_or(slot.name),
			ipv4_addr: slot.ipv4_addr,
			ipv6_addr: slot.ipv6_addr,
			is_brigadier: true,
		};
		let mut generated = generate_user(&self.sealer, &brigade, &seed)?;
		brigade.users.push(generated.user);
		brigade.validate(self.store.max_users())?;

		let pushed: std::result::Result<Option<String>, GatewayError> = async {
			self.gateway.wg_add(&interface_params(&brigade)).await?;
			match self.gateway.peer_add(&generated.params).await {
				Ok(certificate) => Ok(certificate),
				Err(e) => {
					if let Err(cleanup) = self.gateway.wg_del(&wg_del_params(&brigade)).await {
						warn!(error = %cleanup, "failed to delete interface of unfinished brigade");
					}
					Err(e)
				}
			}
		}
		.await;
		let certificate = match pushed {
			Ok(certificate) => certificate,
			Err(e) => {
				if let Err(cleanup) = txn.destroy() {
					warn!(error = %cleanup, "failed to remove partial brigade directory");
				}
				return Err(e.into());
			}
		};
		attach_certificate(&mut generated.bundle, certificate);

		txn.commit(&brigade)?;
		info!(user_id = %seed.user_id, protocols = ?brigade.enabled_protocols(), "brigade created");
		Ok(IssuedUser {
			brigade_id: brigade.brigade_id,
			user_id: seed.user_id,
			name: seed.name,
			bundle: generated.bundle,
		})
	}

	/// Tear down the interface on the gateway, then remove the record.
	#[instrument(skip(self), fields(brigade_id = %id))]
	pub async fn destroy_brigade(&self, id: &BrigadeId) -> Result<()> {
		let (txn, brigade) = self.store.open_for_modify(id)?;
		self.gateway.wg_del(&wg_del_params(&brigade)).await?;
		txn.destroy()?;
		info!("brigade destroyed");
		Ok(())
	}

	pub fn brigade(&self, id: &BrigadeId) -> Result<Brigade> {
		Ok(self.store.open_for_read(id)?)
	}

	pub fn list_brigades(&self) -> Result<Vec<BrigadeId>> {
		Ok(self.store.list()?)
	}

	pub fn list_users(&self, id: &BrigadeId) -> Result<Vec<UserSummary>> {
		let brigade = self.store.open_for_read(id)?;
		Ok(brigade
			.users
			.iter()
			.map(|u| UserSummary {
				user_id: u.user_id,
				name: u.name.clone(),
				created_at: u.created_at,
				is_brigadier: u.is_brigadier,
				is_blocked: u.is_blocked,
				ipv4_addr: u.ipv4_addr,
				ipv6_addr: u.ipv6_addr,
				protocols: u.protocols(),
				traffic: u.quota.counters.clone(),
				last_activity: u.quota.last_activity.clone(),
			})
			.collect())
	}

	/// Stamp the brigadier's latest visit to the keydesk.
	#[instrument(skip(self), fields(brigade_id = %id))]
	pub fn record_visit(&self, id: &BrigadeId, at: DateTime<Utc>) -> Result<()> {
		let (mut txn, mut brigade) = self.store.open_for_modify(id)?;
		brigade.keydesk_last_visit = Some(at);
		txn.commit(&brigade)?;
		Ok(())
	}

	/// Push the stored record to the gateway again.
	pub async fn replay_brigade(&self, id: &BrigadeId, options: ReplayOptions) -> Result<ReplayReport> {
		let brigade = self.store.open_for_read(id)?;
		replay(self.gateway.as_ref(), &brigade, options).await
	}

	/// Bring the stored record in line with `fresh`.
	///
	/// Per-user differences are applied to the gateway and committed. A
	/// brigade-level difference is reported as
	/// [`PatchOutcome::FullReplayRequired`] unless `force` is set, in which
	/// case the old interface is deleted, `fresh` is committed as-is and
	/// fully replayed.
	#[instrument(skip(self, fresh), fields(brigade_id = %fresh.brigade_id, force))]
	pub async fn patch(&self, fresh: &Brigade, force: bool) -> Result<PatchOutcome> {
		let (mut txn, stored) = self.store.open_for_modify(&fresh.brigade_id)?;

		match reconcile(&stored, fresh) {
			Reconciliation::Patch(plan) => {
				let mut settled = plan.brigade.clone();
				settled
					.users
					.retain(|u| u.pending != Some(PendingAction::Delete));
				for user in &mut settled.users {
					user.pending = None;
				}
				settled.validate(self.store.max_users())?;

				let (brigade, summary) = apply_patch(self.gateway.as_ref(), plan).await?;
				txn.commit(&brigade)?;
				Ok(PatchOutcome::Applied(summary))
			}
			Reconciliation::FullReplayRequired { changed } if !force => {
				info!(?changed, "full replay required");
				Ok(PatchOutcome::FullReplayRequired { changed })
			}
			Reconciliation::FullReplayRequired { changed } => {
				warn!(?changed, "forcing brigade-level change");
				let mut fresh = fresh.clone();
				for user in &mut fresh.users {
					user.pending = None;
				}
				fresh.validate(self.store.max_users())?;

				self.gateway.wg_del(&wg_del_params(&stored)).await?;
				let report = replay(self.gateway.as_ref(), &fresh, ReplayOptions::default()).await?;
				txn.commit(&fresh)?;
				Ok(PatchOutcome::Replaced(report))
			}
		}
	}

	/// Commit `brigade` then rebuild it on the gateway from scratch.
	pub(crate) async fn commit_and_replay(
		&self,
		mut txn: keydesk_store::Transaction,
		brigade: &Brigade,
	) -> Result<ReplayReport> {
		txn.commit(brigade)?;
		replay(
			self.gateway.as_ref(),
			brigade,
			ReplayOptions {
				delete_interface: true,
			},
		)
		.await
	}
}

pub(crate) fn attach_certificate(bundle: &mut ClientBundle, certificate: Option<String>) {
	if bundle.ovc.is_none() {
		return;
	}
	match certificate {
		Some(pem) => bundle.complete_ovc(pem),
		None => warn!(user_id = %bundle.user_id, "gateway issued no OpenVPN client certificate"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{new_brigade, Harness};
	use crate::users::NewUser;
	use crate::{ErrorKind, KeydeskError};
	use chrono::TimeZone;
	use keydesk_gateway::Verb;
	use keydesk_protocols::params::CONTROL_HOST;
	use keydesk_seal::Custodian;
	use keydesk_store::StoreError;

	#[tokio::test]
	async fn create_brigade_pushes_interface_then_brigadier() {
		let h = Harness::empty(250);
		let issued = h
			.keydesk
			.create_brigade(new_brigade(&[Protocol::Ovc]))
			.await
			.unwrap();

		let calls = h.gateway.calls();
		assert_eq!(h.gateway.verbs(), vec![Verb::WgAdd, Verb::PeerAdd]);
		assert!(calls[1].params.contains(CONTROL_HOST));
		assert!(issued.bundle.ovc.as_ref().is_some_and(|o| o.is_complete()));

		let brigade = h.keydesk.brigade(&issued.brigade_id).unwrap();
		assert_eq!(brigade.users.len(), 1);
		assert!(brigade.users[0].is_brigadier);
		assert_eq!(brigade.users[0].user_id, issued.user_id);
		assert_eq!(brigade.enabled_protocols(), vec![Protocol::WireGuard, Protocol::Ovc]);

		let private = brigade
			.wg_private
			.open(Custodian::Router, h.router.private_key())
			.unwrap();
		assert!(!private.is_empty());
	}

	#[tokio::test]
	async fn failed_creation_leaves_no_record() {
		let h = Harness::empty(250);
		h.gateway.fail_on(Verb::PeerAdd, 0, 2);
		let request = new_brigade(&[]);
		let id = request.brigade_id;

		let err = h.keydesk.create_brigade(request).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::ExternalDependency);
		assert_eq!(h.gateway.verbs(), vec![Verb::WgAdd, Verb::PeerAdd, Verb::WgDel]);
		assert!(h.keydesk.list_brigades().unwrap().is_empty());
		assert!(matches!(
			h.keydesk.brigade(&id),
			Err(KeydeskError::Store(StoreError::NotFound(_)))
		));
	}

	#[tokio::test]
	async fn creating_an_existing_brigade_is_invalid() {
		let h = Harness::with_brigade(&[]).await;
		let mut request = new_brigade(&[]);
		request.brigade_id = h.id;
		h.gateway.clear();

		let err = h.keydesk.create_brigade(request).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Invalid);
		assert!(h.gateway.calls().is_empty());
	}

	#[tokio::test]
	async fn destroy_removes_interface_and_record() {
		let h = Harness::with_brigade(&[]).await;
		h.gateway.clear();
		h.keydesk.destroy_brigade(&h.id).await.unwrap();

		assert_eq!(h.gateway.verbs(), vec![Verb::WgDel]);
		assert!(h.keydesk.list_brigades().unwrap().is_empty());
	}

	#[tokio::test]
	async fn list_users_reports_state() {
		let h = Harness::with_brigade(&[Protocol::Outline]).await;
		let user = h.keydesk.add_user(&h.id, NewUser::default()).await.unwrap();
		h.keydesk.block_user(&h.id, &user.user_id).await.unwrap();

		let users = h.keydesk.list_users(&h.id).unwrap();
		assert_eq!(users.len(), 2);
		assert!(users[0].is_brigadier);
		assert!(users[1].is_blocked);
		assert_eq!(users[1].protocols, vec![Protocol::WireGuard, Protocol::Outline]);
	}

	#[tokio::test]
	async fn visit_is_stamped() {
		let h = Harness::with_brigade(&[]).await;
		let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
		h.keydesk.record_visit(&h.id, at).unwrap();
		assert_eq!(h.keydesk.brigade(&h.id).unwrap().keydesk_last_visit, Some(at));
	}

	#[tokio::test]
	async fn patch_applies_user_changes() {
		let h = Harness::with_brigade(&[]).await;
		let user = h.keydesk.add_user(&h.id, NewUser::default()).await.unwrap();
		let mut fresh = h.keydesk.brigade(&h.id).unwrap();
		fresh.users.retain(|u| u.user_id != user.user_id);
		h.gateway.clear();

		let outcome = h.keydesk.patch(&fresh, false).await.unwrap();
		assert_eq!(
			outcome,
			PatchOutcome::Applied(PatchSummary {
				deleted: 1,
				..Default::default()
			})
		);
		assert_eq!(h.gateway.verbs(), vec![Verb::PeerDel]);
		assert_eq!(h.keydesk.brigade(&h.id).unwrap().users.len(), 1);
	}

	#[tokio::test]
	async fn invalid_patch_touches_neither_gateway_nor_record() {
		let h = Harness::with_brigade(&[]).await;
		h.keydesk.add_user(&h.id, NewUser::default()).await.unwrap();
		let before = std::fs::read(h.keydesk.store().record_path(&h.id)).unwrap();
		let mut fresh = h.keydesk.brigade(&h.id).unwrap();
		let mut twin = fresh.users[1].clone();
		twin.user_id = UserId::new_v4();
		fresh.users.push(twin);
		h.gateway.clear();

		let err = h.keydesk.patch(&fresh, false).await.unwrap_err();
		assert!(matches!(err, KeydeskError::Validation(_)));
		assert_eq!(err.kind(), ErrorKind::Integrity);
		assert!(h.gateway.calls().is_empty());
		assert_eq!(before, std::fs::read(h.keydesk.store().record_path(&h.id)).unwrap());
	}

	#[tokio::test]
	async fn brigade_change_needs_force() {
		let h = Harness::with_brigade(&[]).await;
		let before = std::fs::read(h.keydesk.store().record_path(&h.id)).unwrap();
		let mut fresh = h.keydesk.brigade(&h.id).unwrap();
		fresh.endpoint_port = 443;
		h.gateway.clear();

		let outcome = h.keydesk.patch(&fresh, false).await.unwrap();
		assert_eq!(
			outcome,
			PatchOutcome::FullReplayRequired {
				changed: vec!["endpoint_port"]
			}
		);
		assert!(h.gateway.calls().is_empty());
		assert_eq!(before, std::fs::read(h.keydesk.store().record_path(&h.id)).unwrap());

		let outcome = h.keydesk.patch(&fresh, true).await.unwrap();
		assert!(matches!(outcome, PatchOutcome::Replaced(r) if r.peers_restored == 1));
		assert_eq!(h.gateway.verbs(), vec![Verb::WgDel, Verb::WgAdd, Verb::PeerAdd]);
		assert_eq!(h.keydesk.brigade(&h.id).unwrap().endpoint_port, 443);
	}
}
