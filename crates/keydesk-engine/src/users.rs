// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User lifecycle: add, delete, block, unblock and rotate.

use keydesk_alloc::allocate_user;
use keydesk_model::{Brigade, BrigadeId, UserId};
use keydesk_protocols::params::{peer_del_params, peer_params};
use keydesk_protocols::{generate_user, regenerate_user, UserSeed};
use tracing::{info, instrument};

use crate::error::{KeydeskError, Result};
use crate::keydesk::{attach_certificate, IssuedUser, Keydesk};

#[derive(Debug, Clone, Default)]
pub struct NewUser {
	/// Defaults to a generated pseudonym.
	pub name: Option<String>,
	pub brigadier: bool,
}

fn position(brigade: &Brigade, user_id: &UserId) -> Result<usize> {
	brigade
		.users
		.iter()
		.position(|u| &u.user_id == user_id)
		.ok_or(KeydeskError::UserNotFound(*user_id))
}

impl Keydesk {
	#[instrument(skip(self, request), fields(brigade_id = %id, brigadier = request.brigadier))]
	pub async fn add_user(&self, id: &BrigadeId, request: NewUser) -> Result<IssuedUser> {
		let (mut txn, mut brigade) = self.store.open_for_modify(id)?;

		if request.brigadier && brigade.brigadier().is_some() {
			return Err(KeydeskError::BrigadierExists(*id));
		}
		let max = self.store.max_users();
		if brigade.users.len() >= max {
			return Err(KeydeskError::UserLimit {
				brigade_id: *id,
				max,
			});
		}

		let slot = allocate_user(&brigade, self.names.as_ref())?;
		let seed = UserSeed {
			user_id: slot.user_id,
			name: request.name.unwrap_or(slot.name),
			ipv4_addr: slot.ipv4_addr,
			ipv6_addr: slot.ipv6_addr,
			is_brigadier: request.brigadier,
		};
		let mut generated = generate_user(&self.sealer, &brigade, &seed)?;
		if request.brigadier {
			brigade.users.insert(0, generated.user);
		} else {
			brigade.users.push(generated.user);
		}
		brigade.validate(max)?;

		let certificate = self.gateway.peer_add(&generated.params).await?;
		attach_certificate(&mut generated.bundle, certificate);

		txn.commit(&brigade)?;
		info!(user_id = %seed.user_id, users = brigade.users.len(), "user added");
		Ok(IssuedUser {
			brigade_id: *id,
			user_id: seed.user_id,
			name: seed.name,
			bundle: generated.bundle,
		})
	}

	/// Remove a user and its peer. The brigadier cannot be deleted.
	#[instrument(skip(self), fields(brigade_id = %id, user_id = %user_id))]
	pub async fn delete_user(&self, id: &BrigadeId, user_id: &UserId) -> Result<()> {
		let (mut txn, mut brigade) = self.store.open_for_modify(id)?;
		let index = position(&brigade, user_id)?;
		let user = &brigade.users[index];
		if user.is_brigadier {
			return Err(KeydeskError::BrigadierProtected(*user_id));
		}

		// A blocked user has no peer on the gateway.
		if !user.is_blocked {
			self.gateway.peer_del(&peer_del_params(&brigade, user)).await?;
		}
		brigade.users.remove(index);
		txn.commit(&brigade)?;
		info!("user deleted");
		Ok(())
	}

	/// Remove the user's peer but keep its record. Blocking a blocked user is
	/// a no-op.
	#[instrument(skip(self), fields(brigade_id = %id, user_id = %user_id))]
	pub async fn block_user(&self, id: &BrigadeId, user_id: &UserId) -> Result<()> {
		let (mut txn, mut brigade) = self.store.open_for_modify(id)?;
		let index = position(&brigade, user_id)?;
		let user = &brigade.users[index];
		if user.is_brigadier {
			return Err(KeydeskError::BrigadierProtected(*user_id));
		}
		if user.is_blocked {
			return Ok(());
		}

		self.gateway.peer_del(&peer_del_params(&brigade, user)).await?;
		brigade.users[index].is_blocked = true;
		txn.commit(&brigade)?;
		info!("user blocked");
		Ok(())
	}

	#[instrument(skip(self), fields(brigade_id = %id, user_id = %user_id))]
	pub async fn unblock_user(&self, id: &BrigadeId, user_id: &UserId) -> Result<()> {
		let (mut txn, mut brigade) = self.store.open_for_modify(id)?;
		let index = position(&brigade, user_id)?;
		if !brigade.users[index].is_blocked {
			return Ok(());
		}

		brigade.users[index].is_blocked = false;
		self.gateway
			.peer_add(&peer_params(&brigade, &brigade.users[index]))
			.await?;
		txn.commit(&brigade)?;
		info!("user unblocked");
		Ok(())
	}

	/// Replace every secret of a user in place. Identity, addresses, name and
	/// counters are kept; the old peer is removed and the new one added.
	#[instrument(skip(self), fields(brigade_id = %id, user_id = %user_id))]
	pub async fn rotate_user(&self, id: &BrigadeId, user_id: &UserId) -> Result<IssuedUser> {
		let (mut txn, mut brigade) = self.store.open_for_modify(id)?;
		let index = position(&brigade, user_id)?;
		let old = brigade.users[index].clone();
		let mut generated = regenerate_user(&self.sealer, &brigade, &old)?;
		brigade.users[index] = generated.user;
		brigade.validate(self.store.max_users())?;

		if !old.is_blocked {
			self.gateway.peer_del(&peer_del_params(&brigade, &old)).await?;
			let certificate = self.gateway.peer_add(&generated.params).await?;
			attach_certificate(&mut generated.bundle, certificate);
		}

		txn.commit(&brigade)?;
		info!("user secrets rotated");
		Ok(IssuedUser {
			brigade_id: *id,
			user_id: old.user_id,
			name: old.name,
			bundle: generated.bundle,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::Harness;
	use keydesk_gateway::Verb;
	use keydesk_model::Protocol;

	#[tokio::test]
	async fn add_user_commits_and_issues_bundle() {
		let h = Harness::with_brigade(&[Protocol::Ovc, Protocol::Outline]).await;
		h.gateway.clear();

		let issued = h
			.keydesk
			.add_user(&h.id, NewUser::default())
			.await
			.unwrap();
		assert_eq!(h.gateway.verbs(), vec![Verb::PeerAdd]);
		assert!(issued.bundle.ovc.as_ref().is_some_and(|o| o.is_complete()));
		assert!(issued.bundle.outline.is_some());

		let stored = h.keydesk.brigade(&h.id).unwrap();
		assert_eq!(stored.users.len(), 2);
		assert_eq!(stored.users[1].user_id, issued.user_id);
		assert!(!stored.users[1].is_brigadier);
	}

	#[tokio::test]
	async fn user_limit_is_a_resource_error() {
		let h = Harness::with_limit(2).await;
		h.keydesk.add_user(&h.id, NewUser::default()).await.unwrap();
		let err = h
			.keydesk
			.add_user(&h.id, NewUser::default())
			.await
			.unwrap_err();
		assert!(matches!(err, KeydeskError::UserLimit { max: 2, .. }));
		assert_eq!(err.kind(), crate::ErrorKind::ResourceLimit);
	}

	#[tokio::test]
	async fn brigadier_cannot_be_deleted_or_blocked() {
		let h = Harness::with_brigade(&[]).await;
		let brigadier = h.keydesk.brigade(&h.id).unwrap().users[0].user_id;
		assert!(matches!(
			h.keydesk.delete_user(&h.id, &brigadier).await,
			Err(KeydeskError::BrigadierProtected(_))
		));
		assert!(matches!(
			h.keydesk.block_user(&h.id, &brigadier).await,
			Err(KeydeskError::BrigadierProtected(_))
		));
	}

	#[tokio::test]
	async fn block_unblock_delete_cycle() {
		let h = Harness::with_brigade(&[]).await;
		let user = h.keydesk.add_user(&h.id, NewUser::default()).await.unwrap();
		h.gateway.clear();

		h.keydesk.block_user(&h.id, &user.user_id).await.unwrap();
		h.keydesk.block_user(&h.id, &user.user_id).await.unwrap();
		assert!(h.keydesk.brigade(&h.id).unwrap().users[1].is_blocked);
		assert_eq!(h.gateway.verbs(), vec![Verb::PeerDel]);

		h.keydesk.unblock_user(&h.id, &user.user_id).await.unwrap();
		assert!(!h.keydesk.brigade(&h.id).unwrap().users[1].is_blocked);

		h.keydesk.block_user(&h.id, &user.user_id).await.unwrap();
		h.gateway.clear();
		h.keydesk.delete_user(&h.id, &user.user_id).await.unwrap();
		assert!(h.gateway.calls().is_empty());
		assert_eq!(h.keydesk.brigade(&h.id).unwrap().users.len(), 1);
	}

	#[tokio::test]
	async fn unknown_user_is_invalid() {
		let h = Harness::with_brigade(&[]).await;
		let err = h
			.keydesk
			.delete_user(&h.id, &keydesk_alloc::new_user_id(&Default::default()))
			.await
			.unwrap_err();
		assert!(matches!(err, KeydeskError::UserNotFound(_)));
		assert_eq!(err.kind(), crate::ErrorKind::Invalid);
	}

	#[tokio::test]
	async fn rotation_keeps_identity_and_replaces_secrets() {
		let h = Harness::with_brigade(&[Protocol::Ipsec]).await;
		let user = h.keydesk.add_user(&h.id, NewUser::default()).await.unwrap();
		let before = h.keydesk.brigade(&h.id).unwrap().users[1].clone();
		h.gateway.clear();

		let rotated = h.keydesk.rotate_user(&h.id, &user.user_id).await.unwrap();
		let after = h.keydesk.brigade(&h.id).unwrap().users[1].clone();

		assert_eq!(rotated.user_id, before.user_id);
		assert_eq!(after.ipv4_addr, before.ipv4_addr);
		assert_eq!(after.name, before.name);
		assert_eq!(after.created_at, before.created_at);
		assert_ne!(after.wg.public_key, before.wg.public_key);
		assert_ne!(after.ipsec, before.ipsec);

		let calls = h.gateway.calls();
		assert_eq!(calls[0].verb, Verb::PeerDel);
		assert_eq!(calls[0].target(), before.wg.public_key.to_base64());
		assert_eq!(calls[1].verb, Verb::PeerAdd);
		assert_eq!(calls[1].target(), after.wg.public_key.to_base64());
	}

	#[tokio::test]
	async fn failed_gateway_call_leaves_record_unchanged() {
		let h = Harness::with_brigade(&[]).await;
		let before = std::fs::read(h.keydesk.store().record_path(&h.id)).unwrap();
		h.gateway.fail_on(Verb::PeerAdd, 1, 3);

		let err = h
			.keydesk
			.add_user(&h.id, NewUser::default())
			.await
			.unwrap_err();
		assert_eq!(err.kind(), crate::ErrorKind::ExternalDependency);
		let after = std::fs::read(h.keydesk.store().record_path(&h.id)).unwrap();
		assert_eq!(before, after);
	}
}
