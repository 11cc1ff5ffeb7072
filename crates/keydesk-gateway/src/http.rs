// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON-over-HTTP gateway client: `POST {base}/{verb}` with the parameters as
//! a flat JSON object.

use std::time::Duration;

use async_trait::async_trait;
use keydesk_protocols::GatewayParams;
use keydesk_seal::Plaintext;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, GatewayResponse};
use crate::verb::Verb;

const USER_AGENT: &str = concat!("keydesk/", env!("CARGO_PKG_VERSION"));

pub struct HttpGateway {
	client: Client,
	base_url: Url,
	token: Option<Plaintext>,
}

impl std::fmt::Debug for HttpGateway {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpGateway")
			.field("base_url", &self.base_url.as_str())
			.field("token", &self.token.as_ref().map(|_| keydesk_seal::REDACTED))
			.finish()
	}
}

impl HttpGateway {
	pub fn new(base_url: &str, token: Option<Plaintext>, timeout: Duration) -> Result<Self> {
		// A trailing slash makes `join` append instead of replacing the last
		// path segment.
		let normalized = format!("{}/", base_url.trim_end_matches('/'));
		let base_url = Url::parse(&normalized).map_err(|e| GatewayError::InvalidUrl {
			url: base_url.to_string(),
			message: e.to_string(),
		})?;

		let client = Client::builder()
			.user_agent(USER_AGENT)
			.timeout(timeout)
			.build()
			.map_err(GatewayError::Client)?;

		Ok(Self {
			client,
			base_url,
			token,
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, verb: Verb) -> Result<Url> {
		self
			.base_url
			.join(verb.as_str())
			.map_err(|e| GatewayError::InvalidUrl {
				url: self.base_url.to_string(),
				message: e.to_string(),
			})
	}
}

#[async_trait]
impl Gateway for HttpGateway {
	#[instrument(skip(self, params), fields(%verb, target = %verb.target(params)))]
	async fn call(&self, verb: Verb, params: &GatewayParams) -> Result<GatewayResponse> {
		let url = self.endpoint(verb)?;
		let target = verb.target(params);

		let mut request = self.client.post(url).json(params);
		if let Some(token) = &self.token {
			request = request.bearer_auth(token.expose_text());
		}

		let response = request.send().await.map_err(|source| GatewayError::Request {
			verb,
			target: target.clone(),
			source,
		})?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			warn!(status = status.as_u16(), "gateway returned error status");
			return Err(GatewayError::Status {
				verb,
				target,
				status: status.as_u16(),
				message,
			});
		}

		let body = response.text().await.map_err(|source| GatewayError::Request {
			verb,
			target: target.clone(),
			source,
		})?;
		let parsed: GatewayResponse =
			serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
				verb,
				target,
				message: e.to_string(),
			})?;

		debug!(code = parsed.code, "gateway call completed");
		Ok(parsed)
	}
}
