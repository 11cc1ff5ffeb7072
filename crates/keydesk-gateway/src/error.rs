// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::verb::Verb;

/// A failed gateway call. Every variant names the verb and the target key it
/// was aimed at, so a failed replay can be resumed by hand.
#[derive(Error, Debug)]
pub enum GatewayError {
	#[error("{verb} {target}: request failed: {source}")]
	Request {
		verb: Verb,
		target: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("{verb} {target}: HTTP {status}: {message}")]
	Status {
		verb: Verb,
		target: String,
		status: u16,
		message: String,
	},

	#[error("{verb} {target}: gateway returned code {code}")]
	Rejected { verb: Verb, target: String, code: i64 },

	#[error("{verb} {target}: malformed response: {message}")]
	Decode {
		verb: Verb,
		target: String,
		message: String,
	},

	#[error("invalid gateway URL {url}: {message}")]
	InvalidUrl { url: String, message: String },

	#[error("failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),
}

impl GatewayError {
	pub fn verb(&self) -> Option<Verb> {
		match self {
			GatewayError::Request { verb, .. }
			| GatewayError::Status { verb, .. }
			| GatewayError::Rejected { verb, .. }
			| GatewayError::Decode { verb, .. } => Some(*verb),
			GatewayError::InvalidUrl { .. } | GatewayError::Client(_) => None,
		}
	}

	pub fn target(&self) -> Option<&str> {
		match self {
			GatewayError::Request { target, .. }
			| GatewayError::Status { target, .. }
			| GatewayError::Rejected { target, .. }
			| GatewayError::Decode { target, .. } => Some(target),
			GatewayError::InvalidUrl { .. } | GatewayError::Client(_) => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, GatewayError>;
