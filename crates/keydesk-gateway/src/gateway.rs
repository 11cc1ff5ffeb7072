// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use keydesk_protocols::GatewayParams;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::verb::Verb;

/// Reply to any control verb. A non-zero `code` is a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
	pub code: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub openvpn_client_certificate: Option<String>,
}

/// The router control API.
#[async_trait]
pub trait Gateway: Send + Sync {
	/// Send one verb. Implementations return the raw response; the helpers
	/// below turn a non-zero code into [`GatewayError::Rejected`].
	async fn call(&self, verb: Verb, params: &GatewayParams) -> Result<GatewayResponse>;

	async fn wg_add(&self, params: &GatewayParams) -> Result<()> {
		checked(self, Verb::WgAdd, params).await.map(|_| ())
	}

	async fn wg_del(&self, params: &GatewayParams) -> Result<()> {
		checked(self, Verb::WgDel, params).await.map(|_| ())
	}

	/// Returns the OpenVPN client certificate when the call carried a CSR.
	async fn peer_add(&self, params: &GatewayParams) -> Result<Option<String>> {
		checked(self, Verb::PeerAdd, params)
			.await
			.map(|r| r.openvpn_client_certificate)
	}

	async fn peer_del(&self, params: &GatewayParams) -> Result<()> {
		checked(self, Verb::PeerDel, params).await.map(|_| ())
	}

	async fn stat(&self, params: &GatewayParams) -> Result<GatewayResponse> {
		checked(self, Verb::Stat, params).await
	}
}

async fn checked<G: Gateway + ?Sized>(
	gateway: &G,
	verb: Verb,
	params: &GatewayParams,
) -> Result<GatewayResponse> {
	let response = gateway.call(verb, params).await?;
	if response.code != 0 {
		return Err(GatewayError::Rejected {
			verb,
			target: verb.target(params),
			code: response.code,
		});
	}
	Ok(response)
}
