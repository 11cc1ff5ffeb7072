// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use keydesk_model::{BrigadeId, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("brigade {0} not found")]
	NotFound(BrigadeId),

	#[error("brigade {0} already exists")]
	AlreadyExists(BrigadeId),

	#[error("brigade {0} is locked by another writer")]
	Busy(BrigadeId),

	#[error("failed to decode {path}: {source}")]
	Decode {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("failed to encode brigade {id}: {source}")]
	Encode {
		id: BrigadeId,
		#[source]
		source: serde_json::Error,
	},

	#[error("record at {path} belongs to brigade {found}, expected {expected}")]
	IdMismatch {
		path: PathBuf,
		expected: BrigadeId,
		found: BrigadeId,
	},

	#[error("invalid brigade record: {0}")]
	Invalid(#[from] ValidationError),

	#[error("transaction already closed")]
	Closed,

	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl StoreError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		StoreError::Io {
			path: path.into(),
			source,
		}
	}

	/// Whether the stored data itself is broken, as opposed to the caller
	/// or the environment.
	pub fn is_integrity(&self) -> bool {
		matches!(
			self,
			StoreError::Decode { .. } | StoreError::IdMismatch { .. } | StoreError::Invalid(_)
		)
	}
}

pub type Result<T> = std::result::Result<T, StoreError>;
