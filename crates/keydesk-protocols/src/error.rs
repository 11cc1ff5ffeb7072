// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use keydesk_model::Protocol;
use keydesk_seal::SealError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
	#[error("sealing failed: {0}")]
	Seal(#[from] SealError),

	#[error("certificate generation failed: {0}")]
	Certificate(#[from] rcgen::Error),

	#[error("{0} is not enabled for this brigade")]
	NotEnabled(Protocol),

	#[error("{0} is already enabled for this brigade")]
	AlreadyEnabled(Protocol),

	#[error("no fake domains configured")]
	NoFakeDomains,

	#[error("no free port left for {0}")]
	NoFreePort(Protocol),

	#[error("gateway returned no client certificate")]
	MissingCertificate,

	#[error("failed to encode client bundle: {0}")]
	Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
