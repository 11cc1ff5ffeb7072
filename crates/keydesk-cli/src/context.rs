// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use anyhow::Context;
use keydesk_config::KeydeskConfig;
use keydesk_engine::Keydesk;
use keydesk_gateway::HttpGateway;

pub struct CliContext {
	pub keydesk: Keydesk,
}

impl CliContext {
	pub fn new(keydesk: Keydesk) -> Self {
		Self { keydesk }
	}

	pub fn from_config(config: &KeydeskConfig) -> anyhow::Result<Self> {
		let gateway = HttpGateway::new(
			&config.gateway.url,
			config.gateway.token.clone(),
			config.gateway.timeout,
		)
		.context("failed to build gateway client")?;
		Ok(Self::new(Keydesk::from_config(config, Arc::new(gateway))))
	}
}
