// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Applying a reconciled [`PatchPlan`] to the gateway.

use keydesk_gateway::{Gateway, GatewayError};
use keydesk_model::{Brigade, PendingAction, User};
use keydesk_protocols::params::{peer_del_params, peer_params};
use keydesk_reconcile::PatchPlan;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{KeydeskError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatchSummary {
	pub created: usize,
	pub deleted: usize,
	pub replayed: usize,
	pub blocked: usize,
}

impl PatchSummary {
	pub fn is_empty(&self) -> bool {
		*self == PatchSummary::default()
	}
}

/// Send the gateway calls for every flagged user: deletes and blocks first,
/// then replays, then creates. Returns the brigade with deleted users removed
/// and every flag cleared, ready to commit.
#[instrument(skip_all, fields(brigade_id = %plan.brigade.brigade_id))]
pub async fn apply_patch(gateway: &dyn Gateway, plan: PatchPlan) -> Result<(Brigade, PatchSummary)> {
	let mut brigade = plan.brigade;
	let mut summary = PatchSummary::default();

	for user in flagged(&brigade, &[PendingAction::Delete, PendingAction::Block]) {
		debug!(user_id = %user.user_id, action = ?user.pending, "removing peer");
		gateway
			.peer_del(&peer_del_params(&brigade, user))
			.await
			.map_err(|source| failed(user, source))?;
		match user.pending {
			Some(PendingAction::Delete) => summary.deleted += 1,
			_ => summary.blocked += 1,
		}
	}

	for user in flagged(&brigade, &[PendingAction::Replay]) {
		debug!(user_id = %user.user_id, "replacing peer");
		gateway
			.peer_del(&peer_del_params(&brigade, user))
			.await
			.map_err(|source| failed(user, source))?;
		gateway
			.peer_add(&peer_params(&brigade, user))
			.await
			.map_err(|source| failed(user, source))?;
		summary.replayed += 1;
	}

	for user in flagged(&brigade, &[PendingAction::Create]) {
		debug!(user_id = %user.user_id, "adding peer");
		gateway
			.peer_add(&peer_params(&brigade, user))
			.await
			.map_err(|source| failed(user, source))?;
		summary.created += 1;
	}

	brigade
		.users
		.retain(|u| u.pending != Some(PendingAction::Delete));
	for user in &mut brigade.users {
		user.pending = None;
	}

	info!(
		created = summary.created,
		deleted = summary.deleted,
		replayed = summary.replayed,
		blocked = summary.blocked,
		"patch applied"
	);
	Ok((brigade, summary))
}

fn flagged<'a>(brigade: &'a Brigade, actions: &'a [PendingAction]) -> impl Iterator<Item = &'a User> {
	brigade
		.users
		.iter()
		.filter(move |u| u.pending.is_some_and(|a| actions.contains(&a)))
}

fn failed(user: &User, source: GatewayError) -> KeydeskError {
	KeydeskError::Patch {
		user_id: user.user_id,
		source,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_gateway::{RecordingGateway, Verb};
	use keydesk_model::testing::{sample_brigade, sample_user, test_sealer};
	use keydesk_reconcile::{reconcile, Reconciliation};

	fn plan(old: &Brigade, fresh: &Brigade) -> PatchPlan {
		match reconcile(old, fresh) {
			Reconciliation::Patch(p) => p,
			other => panic!("expected patch, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn removals_then_replays_then_creates() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 4);
		let mut fresh = old.clone();
		fresh.users.remove(1);
		fresh.users[1].is_blocked = true;
		fresh.users[2].wg.psk = sealer.seal(b"rotated").unwrap();
		let newcomer = sample_user(&sealer, &fresh, 9, false);
		fresh.users.insert(0, newcomer.clone());

		let gw = RecordingGateway::new();
		let (result, summary) = apply_patch(&gw, plan(&old, &fresh)).await.unwrap();

		assert_eq!(
			summary,
			PatchSummary {
				created: 1,
				deleted: 1,
				replayed: 1,
				blocked: 1,
			}
		);
		assert_eq!(
			gw.verbs(),
			vec![
				Verb::PeerDel,
				Verb::PeerDel,
				Verb::PeerDel,
				Verb::PeerAdd,
				Verb::PeerAdd,
			]
		);
		let last = gw.calls().pop().unwrap();
		assert_eq!(last.target(), newcomer.wg.public_key.to_base64());

		assert_eq!(result.users.len(), 4);
		assert!(result.users.iter().all(|u| u.pending.is_none()));
		assert!(result.user(&old.users[1].user_id).is_none());
		result.validate(250).unwrap();
	}

	#[tokio::test]
	async fn noop_plan_makes_no_calls() {
		let brigade = sample_brigade(&test_sealer(), 2);
		let gw = RecordingGateway::new();
		let (result, summary) = apply_patch(&gw, plan(&brigade, &brigade)).await.unwrap();
		assert!(summary.is_empty());
		assert!(gw.calls().is_empty());
		assert_eq!(result.users, brigade.users);
	}

	#[tokio::test]
	async fn gateway_failure_names_the_user() {
		let sealer = test_sealer();
		let old = sample_brigade(&sealer, 2);
		let mut fresh = old.clone();
		fresh.users.pop();

		let gw = RecordingGateway::new();
		gw.fail_on(Verb::PeerDel, 0, 4);
		let err = apply_patch(&gw, plan(&old, &fresh)).await.unwrap_err();
		match err {
			KeydeskError::Patch { user_id, .. } => assert_eq!(user_id, old.users[1].user_id),
			other => panic!("unexpected: {other:?}"),
		}
	}
}
