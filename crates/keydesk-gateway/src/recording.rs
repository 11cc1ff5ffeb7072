// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory gateway that records every call. Used by tests and dry runs.

use std::sync::Mutex;

use async_trait::async_trait;
use keydesk_protocols::params::OPENVPN_CLIENT_CSR;
use keydesk_protocols::GatewayParams;

use crate::error::Result;
use crate::gateway::{Gateway, GatewayResponse};
use crate::verb::Verb;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
	pub verb: Verb,
	pub params: GatewayParams,
}

impl RecordedCall {
	pub fn target(&self) -> String {
		self.verb.target(&self.params)
	}
}

#[derive(Debug, Default)]
struct State {
	calls: Vec<RecordedCall>,
	fail_at: Option<(Verb, usize, i64)>,
}

/// Answers every call with code 0, and with a placeholder certificate when a
/// `peer_add` carries a CSR. [`RecordingGateway::fail_on`] makes the n-th call
/// of a verb return a non-zero code instead.
#[derive(Debug, Default)]
pub struct RecordingGateway {
	state: Mutex<State>,
}

impl RecordingGateway {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fail the `nth` (zero-based) call of `verb` with `code`.
	pub fn fail_on(&self, verb: Verb, nth: usize, code: i64) {
		self.lock().fail_at = Some((verb, nth, code));
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.lock().calls.clone()
	}

	pub fn verbs(&self) -> Vec<Verb> {
		self.lock().calls.iter().map(|c| c.verb).collect()
	}

	pub fn clear(&self) {
		self.lock().calls.clear();
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, State> {
		// A panicking test thread must not hide the calls from the others.
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}
}

#[async_trait]
impl Gateway for RecordingGateway {
	async fn call(&self, verb: Verb, params: &GatewayParams) -> Result<GatewayResponse> {
		let mut state = self.lock();
		let seen = state.calls.iter().filter(|c| c.verb == verb).count();
		state.calls.push(RecordedCall {
			verb,
			params: params.clone(),
		});

		if let Some((fail_verb, nth, code)) = state.fail_at {
			if fail_verb == verb && nth == seen {
				return Ok(GatewayResponse {
					code,
					openvpn_client_certificate: None,
				});
			}
		}

		let openvpn_client_certificate = match verb {
			Verb::PeerAdd if params.contains(OPENVPN_CLIENT_CSR) => Some(format!(
				"-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
				verb.target(params)
			)),
			_ => None,
		};

		Ok(GatewayResponse {
			code: 0,
			openvpn_client_certificate,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::GatewayError;
	use keydesk_protocols::params::{PEER_PUBLIC_KEY, WG_PUBLIC_KEY};

	#[tokio::test]
	async fn records_calls_in_order() {
		let gw = RecordingGateway::new();
		let iface = GatewayParams::new().with(WG_PUBLIC_KEY, "iface");
		gw.wg_add(&iface).await.unwrap();
		gw.peer_add(&iface.clone().with(PEER_PUBLIC_KEY, "a"))
			.await
			.unwrap();

		assert_eq!(gw.verbs(), vec![Verb::WgAdd, Verb::PeerAdd]);
		assert_eq!(gw.calls()[1].target(), "a");
	}

	#[tokio::test]
	async fn issues_certificate_only_for_csr() {
		let gw = RecordingGateway::new();
		let plain = GatewayParams::new().with(PEER_PUBLIC_KEY, "a");
		assert_eq!(gw.peer_add(&plain).await.unwrap(), None);
		let with_csr = plain.with(OPENVPN_CLIENT_CSR, "csr");
		assert!(gw.peer_add(&with_csr).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn injected_failure_hits_nth_call() {
		let gw = RecordingGateway::new();
		gw.fail_on(Verb::PeerAdd, 1, 5);
		let p = |k: &str| GatewayParams::new().with(PEER_PUBLIC_KEY, k);

		gw.peer_add(&p("a")).await.unwrap();
		let err = gw.peer_add(&p("b")).await.unwrap_err();
		assert!(matches!(err, GatewayError::Rejected { code: 5, .. }));
		assert_eq!(err.target(), Some("b"));
		gw.peer_add(&p("c")).await.unwrap();
	}
}
