// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconciliation of a stored brigade against a fresh description of it.
//!
//! A change to anything the gateway interface is built from invalidates every
//! peer, so it is reported as [`Reconciliation::FullReplayRequired`]. Otherwise
//! each user is flagged with the single [`PendingAction`] that brings the
//! gateway in line, and the flagged record is returned as a [`PatchPlan`].

use std::collections::HashMap;

use keydesk_model::{Brigade, PendingAction, User, UserId, WgPublicKey};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
	/// Brigade-level fields differ; names the fields that changed.
	FullReplayRequired { changed: Vec<&'static str> },
	Patch(PatchPlan),
}

/// The stored brigade with its users replaced by the reconciled, flagged list:
/// fresh users in fresh order, then stored users the fresh side lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
	pub brigade: Brigade,
}

impl PatchPlan {
	pub fn actions(&self) -> Vec<(UserId, PendingAction)> {
		self
			.brigade
			.users
			.iter()
			.filter_map(|u| u.pending.map(|a| (u.user_id, a)))
			.collect()
	}

	pub fn count(&self, action: PendingAction) -> usize {
		self
			.brigade
			.users
			.iter()
			.filter(|u| u.pending == Some(action))
			.count()
	}

	pub fn is_noop(&self) -> bool {
		self.brigade.users.iter().all(|u| u.pending.is_none())
	}
}

/// Names of the brigade-level fields that differ between `old` and `fresh`.
pub fn brigade_changes(old: &Brigade, fresh: &Brigade) -> Vec<&'static str> {
	let checks: [(&'static str, bool); 15] = [
		("brigade_id", old.brigade_id == fresh.brigade_id),
		("endpoint_ipv4", old.endpoint_ipv4 == fresh.endpoint_ipv4),
		("endpoint_domain", old.endpoint_domain == fresh.endpoint_domain),
		("endpoint_port", old.endpoint_port == fresh.endpoint_port),
		("dns_v4", old.dns_v4 == fresh.dns_v4),
		("dns_v6", old.dns_v6 == fresh.dns_v6),
		("ipv4_cgnat", old.ipv4_cgnat == fresh.ipv4_cgnat),
		("ipv6_ula", old.ipv6_ula == fresh.ipv6_ula),
		("keydesk_ipv6", old.keydesk_ipv6 == fresh.keydesk_ipv6),
		("wg_public_key", old.wg_public_key == fresh.wg_public_key),
		("wg_private", old.wg_private == fresh.wg_private),
		("ovc", old.ovc == fresh.ovc),
		("ipsec", old.ipsec == fresh.ipsec),
		("outline", old.outline == fresh.outline),
		("proto0", old.proto0 == fresh.proto0),
	];
	checks
		.into_iter()
		.filter(|(_, same)| !same)
		.map(|(name, _)| name)
		.collect()
}

#[instrument(skip_all, fields(brigade_id = %old.brigade_id, old = old.users.len(), fresh = fresh.users.len()))]
pub fn reconcile(old: &Brigade, fresh: &Brigade) -> Reconciliation {
	let changed = brigade_changes(old, fresh);
	if !changed.is_empty() {
		debug!(?changed, "brigade-level change, full replay required");
		return Reconciliation::FullReplayRequired { changed };
	}

	let key = |u: &User| -> (UserId, WgPublicKey) { u.identity() };
	let old_by_key: HashMap<(UserId, WgPublicKey), &User> =
		old.users.iter().map(|u| (key(u), u)).collect();
	let fresh_by_key: HashMap<(UserId, WgPublicKey), &User> =
		fresh.users.iter().map(|u| (key(u), u)).collect();

	let mut users = Vec::with_capacity(old.users.len().max(fresh.users.len()));

	for fresh_user in &fresh.users {
		let mut user = fresh_user.clone();
		user.pending = match old_by_key.get(&key(fresh_user)) {
			Some(old_user) => {
				user.quota = old_user.quota.clone();
				matched_action(old_user, fresh_user)
			}
			None if fresh_user.is_blocked => None,
			None => Some(PendingAction::Create),
		};
		users.push(user);
	}

	for old_user in &old.users {
		if fresh_by_key.contains_key(&key(old_user)) {
			continue;
		}
		let mut user = old_user.clone();
		user.pending = if old_user.is_blocked {
			None
		} else {
			Some(PendingAction::Delete)
		};
		users.push(user);
	}

	let mut brigade = old.clone();
	brigade.users = users;
	let plan = PatchPlan { brigade };
	debug!(
		create = plan.count(PendingAction::Create),
		delete = plan.count(PendingAction::Delete),
		replay = plan.count(PendingAction::Replay),
		block = plan.count(PendingAction::Block),
		"patch planned"
	);
	Reconciliation::Patch(plan)
}

fn matched_action(old: &User, fresh: &User) -> Option<PendingAction> {
	match (old.is_blocked, fresh.is_blocked) {
		(false, true) => Some(PendingAction::Block),
		(true, false) => Some(PendingAction::Create),
		(true, true) => None,
		(false, false) if !old.same_peer_material(fresh) => Some(PendingAction::Replay),
		(false, false) => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_model::testing::{sample_brigade, sample_user, test_sealer};
	use proptest::prelude::*;

	fn plan(r: Reconciliation) -> PatchPlan {
		match r {
			Reconciliation::Patch(p) => p,
			other => panic!("expected patch, got {other:?}"),
		}
	}

	#[test]
	fn identical_records_need_nothing() {
		let sealer = test_sealer();
		let brigade = sample_brigade(&sealer, 3);
		let p = plan(reconcile(&brigade, &brigade));
		assert!(p.is_noop());
		assert_eq!(p.brigade.users, brigade.users);
	}

	#[test]
	fn absent_blocked_user_is_kept_untouched() {
		let sealer = test_sealer();
		let mut old = sample_brigade(&sealer, 1);
		old.users[0].is_blocked = true;
		let mut fresh = old.clone();
		fresh.users.clear();

		let p = plan(reconcile(&old, &fresh));
		assert_eq!(p.brigade.users.len(), 1);
		assert_eq!(p.brigade.users[0].user_id, old.users[0].user_id);
		assert_eq!(p.brigade.users[0].pending, None);
		assert!(p.is_noop());
	}

	#[test]
	fn absent_active_user_is_deleted() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 2);
		let mut fresh = old.clone();
		fresh.users.truncate(1);

		let p = plan(reconcile(&old, &fresh));
		assert_eq!(p.actions(), vec![(old.users[1].user_id, PendingAction::Delete)]);
	}

	#[test]
	fn new_users_are_created_unless_blocked() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 1);
		let mut fresh = old.clone();
		let a = sample_user(&sealer, &fresh, 5, false);
		let mut b = sample_user(&sealer, &fresh, 6, false);
		b.is_blocked = true;
		fresh.users.push(a.clone());
		fresh.users.push(b.clone());

		let p = plan(reconcile(&old, &fresh));
		assert_eq!(p.actions(), vec![(a.user_id, PendingAction::Create)]);
		assert_eq!(p.brigade.users.len(), 3);
	}

	#[test]
	fn block_transitions() {
		let sealer = test_sealer();
		let mut old = sample_brigade(&sealer, 3);
		old.users[2].is_blocked = true;
		let mut fresh = old.clone();
		fresh.users[1].is_blocked = true;
		fresh.users[2].is_blocked = false;

		let p = plan(reconcile(&old, &fresh));
		assert_eq!(
			p.actions(),
			vec![
				(old.users[1].user_id, PendingAction::Block),
				(old.users[2].user_id, PendingAction::Create),
			]
		);
	}

	#[test]
	fn changed_secret_is_replayed() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 2);
		let mut fresh = old.clone();
		fresh.users[1].wg.psk = sealer.seal(b"new psk").unwrap();

		let p = plan(reconcile(&old, &fresh));
		assert_eq!(p.actions(), vec![(old.users[1].user_id, PendingAction::Replay)]);
	}

	#[test]
	fn renamed_user_is_not_replayed() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 1);
		let mut fresh = old.clone();
		fresh.users[0].name = "renamed".into();
		let p = plan(reconcile(&old, &fresh));
		assert!(p.is_noop());
		assert_eq!(p.brigade.users[0].name, "renamed");
	}

	#[test]
	fn new_wg_key_means_delete_and_create() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 1);
		let mut fresh = old.clone();
		fresh.users[0].wg.public_key = keydesk_model::WgPublicKey::from_bytes([0xEE; 32]);

		let p = plan(reconcile(&old, &fresh));
		assert_eq!(p.count(PendingAction::Create), 1);
		assert_eq!(p.count(PendingAction::Delete), 1);
		assert_eq!(p.brigade.users[0].wg.public_key, fresh.users[0].wg.public_key);
		assert_eq!(p.brigade.users[1].wg.public_key, old.users[0].wg.public_key);
	}

	#[test]
	fn interface_change_requires_full_replay() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 2);
		let mut fresh = old.clone();
		fresh.endpoint_port = 51821;
		fresh.outline = None;

		assert_eq!(
			reconcile(&old, &fresh),
			Reconciliation::FullReplayRequired {
				changed: vec!["endpoint_port", "outline"]
			}
		);
	}

	#[test]
	fn counters_survive_from_stored_record() {
		let sealer = test_sealer();
		let mut old = sample_brigade(&sealer, 1);
		old.users[0].quota.counters.total.rx = 42;
		let fresh = {
			let mut f = old.clone();
			f.users[0].quota = Default::default();
			f
		};
		let p = plan(reconcile(&old, &fresh));
		assert_eq!(p.brigade.users[0].quota.counters.total.rx, 42);
	}

	proptest! {
		#[test]
		fn deterministic_and_never_deletes_blocked(
			old_blocked in proptest::collection::vec(any::<bool>(), 0..6),
			keep in proptest::collection::vec(any::<bool>(), 0..6),
			fresh_blocked in proptest::collection::vec(any::<bool>(), 0..6),
		) {
			let sealer = test_sealer();
			let mut old = sample_brigade(&sealer, old_blocked.len());
			for (u, b) in old.users.iter_mut().zip(&old_blocked) {
				u.is_blocked = *b;
			}
			let mut fresh = old.clone();
			fresh.users = old
				.users
				.iter()
				.zip(keep.iter().chain(std::iter::repeat(&true)))
				.filter(|(_, k)| **k)
				.map(|(u, _)| u.clone())
				.collect();
			for (u, b) in fresh.users.iter_mut().zip(&fresh_blocked) {
				u.is_blocked = *b;
			}

			let first = reconcile(&old, &fresh);
			prop_assert_eq!(&first, &reconcile(&old, &fresh));

			let p = plan(first);
			for user in &p.brigade.users {
				if user.pending == Some(PendingAction::Delete) {
					prop_assert!(!user.is_blocked);
				}
			}
			prop_assert_eq!(p.brigade.users.len(), old.users.len());
		}
	}
}
