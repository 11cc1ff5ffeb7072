// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rebuild a brigade on the gateway from its stored record: interface first,
//! then every active peer in stored order.

use keydesk_gateway::Gateway;
use keydesk_model::Brigade;
use keydesk_protocols::params::{interface_params, peer_params, wg_del_params};
use tracing::{info, instrument, warn};

use crate::error::{KeydeskError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOptions {
	/// Send `wg_del` for the interface before recreating it.
	pub delete_interface: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
	pub peers_restored: usize,
	pub blocked_skipped: usize,
}

/// Push `brigade` to the gateway. There is no retry: a failed call stops the
/// replay and the error names the user it stopped at and how many peers were
/// already restored.
#[instrument(skip_all, fields(brigade_id = %brigade.brigade_id, delete_interface = options.delete_interface))]
pub async fn replay(
	gateway: &dyn Gateway,
	brigade: &Brigade,
	options: ReplayOptions,
) -> Result<ReplayReport> {
	let interface_failed = |source| KeydeskError::Replay {
		user_id: None,
		restored: 0,
		source,
	};

	if options.delete_interface {
		gateway
			.wg_del(&wg_del_params(brigade))
			.await
			.map_err(interface_failed)?;
	}
	gateway
		.wg_add(&interface_params(brigade))
		.await
		.map_err(interface_failed)?;

	let mut report = ReplayReport::default();
	for user in &brigade.users {
		if user.is_blocked {
			report.blocked_skipped += 1;
			continue;
		}
		if let Err(source) = gateway.peer_add(&peer_params(brigade, user)).await {
			warn!(user_id = %user.user_id, restored = report.peers_restored, error = %source, "peer replay failed");
			return Err(KeydeskError::Replay {
				user_id: Some(user.user_id),
				restored: report.peers_restored,
				source,
			});
		}
		report.peers_restored += 1;
	}

	info!(
		peers_restored = report.peers_restored,
		blocked_skipped = report.blocked_skipped,
		"brigade replayed"
	);
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_gateway::{RecordingGateway, Verb};
	use keydesk_model::testing::{sample_brigade, test_sealer};
	use keydesk_protocols::params::{CONTROL_HOST, PEER_PUBLIC_KEY};

	#[tokio::test]
	async fn interface_before_peers_in_stored_order() {
		let brigade = sample_brigade(&test_sealer(), 3);
		let gw = RecordingGateway::new();

		let report = replay(&gw, &brigade, ReplayOptions { delete_interface: true })
			.await
			.unwrap();

		assert_eq!(report.peers_restored, 3);
		assert_eq!(
			gw.verbs(),
			vec![Verb::WgDel, Verb::WgAdd, Verb::PeerAdd, Verb::PeerAdd, Verb::PeerAdd]
		);
		let peers: Vec<String> = gw.calls()[2..].iter().map(|c| c.target()).collect();
		let expected: Vec<String> = brigade
			.users
			.iter()
			.map(|u| u.wg.public_key.to_base64())
			.collect();
		assert_eq!(peers, expected);
	}

	#[tokio::test]
	async fn only_brigadier_gets_control_host() {
		let brigade = sample_brigade(&test_sealer(), 2);
		let gw = RecordingGateway::new();
		replay(&gw, &brigade, ReplayOptions::default()).await.unwrap();

		let calls = gw.calls();
		assert_eq!(calls[0].verb, Verb::WgAdd);
		assert_eq!(
			calls[1].params.get(CONTROL_HOST),
			Some(brigade.keydesk_ipv6.to_string().as_str())
		);
		assert!(!calls[2].params.contains(CONTROL_HOST));
	}

	#[tokio::test]
	async fn blocked_users_are_skipped() {
		let mut brigade = sample_brigade(&test_sealer(), 3);
		brigade.users[1].is_blocked = true;
		let gw = RecordingGateway::new();

		let report = replay(&gw, &brigade, ReplayOptions::default()).await.unwrap();
		assert_eq!(report.peers_restored, 2);
		assert_eq!(report.blocked_skipped, 1);
		assert!(gw
			.calls()
			.iter()
			.all(|c| c.params.get(PEER_PUBLIC_KEY)
				!= Some(brigade.users[1].wg.public_key.to_base64().as_str())));
	}

	#[tokio::test]
	async fn failure_reports_user_and_progress() {
		let brigade = sample_brigade(&test_sealer(), 3);
		let gw = RecordingGateway::new();
		gw.fail_on(Verb::PeerAdd, 2, 9);

		let err = replay(&gw, &brigade, ReplayOptions::default())
			.await
			.unwrap_err();
		match err {
			KeydeskError::Replay {
				user_id, restored, ..
			} => {
				assert_eq!(user_id, Some(brigade.users[2].user_id));
				assert_eq!(restored, 2);
			}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[tokio::test]
	async fn interface_failure_sends_no_peers() {
		let brigade = sample_brigade(&test_sealer(), 2);
		let gw = RecordingGateway::new();
		gw.fail_on(Verb::WgAdd, 0, 1);

		let err = replay(&gw, &brigade, ReplayOptions::default())
			.await
			.unwrap_err();
		assert!(matches!(err, KeydeskError::Replay { user_id: None, restored: 0, .. }));
		assert_eq!(gw.verbs(), vec![Verb::WgAdd]);
	}
}
