// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use keydesk_gateway::RecordingGateway;
use keydesk_model::testing::test_custodians;
use keydesk_model::{BrigadeId, Protocol};
use keydesk_protocols::DomainPool;
use keydesk_seal::SealKeyPair;
use keydesk_store::RecordStore;
use tempfile::TempDir;

use crate::keydesk::{Keydesk, NewBrigade};

pub(crate) struct Harness {
	pub keydesk: Keydesk,
	pub gateway: Arc<RecordingGateway>,
	pub id: BrigadeId,
	pub router: SealKeyPair,
	_dir: TempDir,
}

pub(crate) fn new_brigade(protocols: &[Protocol]) -> NewBrigade {
	NewBrigade {
		brigade_id: BrigadeId::new(),
		endpoint_ipv4: "203.0.113.7".parse().unwrap(),
		endpoint_domain: None,
		endpoint_port: 51820,
		dns_v4: "100.64.0.1".parse().unwrap(),
		dns_v6: "fd00:7::1".parse().unwrap(),
		ipv4_cgnat: "100.64.0.0/24".parse().unwrap(),
		ipv6_ula: "fd00:7::/64".parse().unwrap(),
		keydesk_ipv6: "fd00:7::2".parse().unwrap(),
		protocols: protocols.to_vec(),
		brigadier_name: None,
		vip: false,
	}
}

impl Harness {
	pub fn empty(max_users: usize) -> Self {
		let dir = TempDir::new().unwrap();
		let (router, _shuffler, sealer) = test_custodians();
		let gateway = Arc::new(RecordingGateway::new());
		let keydesk = Keydesk::new(
			RecordStore::new(dir.path(), max_users),
			sealer,
			gateway.clone(),
		)
		.with_domains(DomainPool::new(vec![
			"cdn.example.org".to_string(),
			"static.example.com".to_string(),
		]));
		Self {
			keydesk,
			gateway,
			id: BrigadeId::new(),
			router,
			_dir: dir,
		}
	}

	pub async fn with_brigade(protocols: &[Protocol]) -> Self {
		Self::create(250, protocols).await
	}

	pub async fn with_limit(max_users: usize) -> Self {
		Self::create(max_users, &[]).await
	}

	async fn create(max_users: usize, protocols: &[Protocol]) -> Self {
		let mut h = Self::empty(max_users);
		let issued = h
			.keydesk
			.create_brigade(new_brigade(protocols))
			.await
			.unwrap();
		h.id = issued.brigade_id;
		h
	}
}
