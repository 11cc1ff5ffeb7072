// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use keydesk_alloc::AllocError;
use keydesk_gateway::GatewayError;
use keydesk_model::{BrigadeId, Protocol, UserId, ValidationError};
use keydesk_protocols::ProtocolError;
use keydesk_seal::SealError;
use keydesk_store::StoreError;
use thiserror::Error;

/// How a failure should be surfaced and whether a caller may retry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// The stored record or a record about to be stored is broken.
	Integrity,
	/// User quota, address space, ports or a held lock.
	ResourceLimit,
	/// The gateway failed; carries the verb and target.
	ExternalDependency,
	/// The request itself is wrong.
	Invalid,
	Io,
	Crypto,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ErrorKind::Integrity => "integrity",
			ErrorKind::ResourceLimit => "resource-limit",
			ErrorKind::ExternalDependency => "external-dependency",
			ErrorKind::Invalid => "invalid",
			ErrorKind::Io => "io",
			ErrorKind::Crypto => "crypto",
		};
		f.write_str(s)
	}
}

#[derive(Error, Debug)]
pub enum KeydeskError {
	#[error(transparent)]
	Store(#[from] StoreError),

	#[error("invalid brigade record: {0}")]
	Validation(#[from] ValidationError),

	#[error(transparent)]
	Alloc(#[from] AllocError),

	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	#[error(transparent)]
	Seal(#[from] SealError),

	#[error(transparent)]
	Gateway(#[from] GatewayError),

	#[error("brigade {0} already has a brigadier")]
	BrigadierExists(BrigadeId),

	#[error("brigade {brigade_id} already has {max} users")]
	UserLimit { brigade_id: BrigadeId, max: usize },

	#[error("user {0} not found")]
	UserNotFound(UserId),

	#[error("the brigadier {0} cannot be deleted or blocked")]
	BrigadierProtected(UserId),

	#[error("{0} cannot be disabled")]
	ProtocolRequired(Protocol),

	#[error("replay stopped at {}: {source} ({restored} peers restored)", replay_stage(.user_id))]
	Replay {
		/// `None` when the interface calls failed.
		user_id: Option<UserId>,
		restored: usize,
		#[source]
		source: GatewayError,
	},

	#[error("patch stopped at user {user_id}: {source}")]
	Patch {
		user_id: UserId,
		#[source]
		source: GatewayError,
	},
}

impl KeydeskError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			KeydeskError::Store(e) => store_kind(e),
			KeydeskError::Validation(_) => ErrorKind::Integrity,
			KeydeskError::Alloc(_) => ErrorKind::ResourceLimit,
			KeydeskError::Protocol(e) => protocol_kind(e),
			KeydeskError::Seal(_) => ErrorKind::Crypto,
			KeydeskError::Gateway(_) | KeydeskError::Replay { .. } | KeydeskError::Patch { .. } => {
				ErrorKind::ExternalDependency
			}
			KeydeskError::BrigadierExists(_) => ErrorKind::Integrity,
			KeydeskError::UserLimit { .. } => ErrorKind::ResourceLimit,
			KeydeskError::UserNotFound(_)
			| KeydeskError::BrigadierProtected(_)
			| KeydeskError::ProtocolRequired(_) => ErrorKind::Invalid,
		}
	}

	/// The gateway error behind this failure, if any.
	pub fn gateway_error(&self) -> Option<&GatewayError> {
		match self {
			KeydeskError::Gateway(e) => Some(e),
			KeydeskError::Replay { source, .. } | KeydeskError::Patch { source, .. } => Some(source),
			_ => None,
		}
	}
}

fn replay_stage(user_id: &Option<UserId>) -> String {
	match user_id {
		Some(id) => format!("user {id}"),
		None => "interface".to_string(),
	}
}

fn store_kind(e: &StoreError) -> ErrorKind {
	match e {
		e if e.is_integrity() => ErrorKind::Integrity,
		StoreError::NotFound(_) | StoreError::AlreadyExists(_) | StoreError::Closed => {
			ErrorKind::Invalid
		}
		StoreError::Busy(_) => ErrorKind::ResourceLimit,
		StoreError::Encode { .. } => ErrorKind::Integrity,
		_ => ErrorKind::Io,
	}
}

fn protocol_kind(e: &ProtocolError) -> ErrorKind {
	match e {
		ProtocolError::Seal(_) | ProtocolError::Certificate(_) => ErrorKind::Crypto,
		ProtocolError::NotEnabled(_)
		| ProtocolError::AlreadyEnabled(_)
		| ProtocolError::NoFakeDomains => ErrorKind::Invalid,
		ProtocolError::NoFreePort(_) => ErrorKind::ResourceLimit,
		ProtocolError::MissingCertificate => ErrorKind::ExternalDependency,
		ProtocolError::Encode(_) => ErrorKind::Integrity,
	}
}

pub type Result<T> = std::result::Result<T, KeydeskError>;

#[cfg(test)]
mod tests {
	use super::*;
	use keydesk_gateway::Verb;

	#[test]
	fn classifies_failures() {
		let id = BrigadeId::new();
		assert_eq!(
			KeydeskError::from(StoreError::NotFound(id)).kind(),
			ErrorKind::Invalid
		);
		assert_eq!(
			KeydeskError::from(StoreError::Busy(id)).kind(),
			ErrorKind::ResourceLimit
		);
		assert_eq!(
			KeydeskError::from(StoreError::Invalid(ValidationError::MultipleBrigadiers(2))).kind(),
			ErrorKind::Integrity
		);
		assert_eq!(
			KeydeskError::from(AllocError::Exhausted {
				prefix: "100.64.0.0/30".into()
			})
			.kind(),
			ErrorKind::ResourceLimit
		);
		assert_eq!(KeydeskError::from(SealError::Open).kind(), ErrorKind::Crypto);
		assert_eq!(
			KeydeskError::from(ProtocolError::NotEnabled(Protocol::Ovc)).kind(),
			ErrorKind::Invalid
		);
		assert_eq!(KeydeskError::BrigadierExists(id).kind(), ErrorKind::Integrity);
	}

	#[test]
	fn replay_error_names_the_failing_user() {
		let user_id = uuid_like();
		let err = KeydeskError::Replay {
			user_id: Some(user_id),
			restored: 3,
			source: GatewayError::Rejected {
				verb: Verb::PeerAdd,
				target: "peer".into(),
				code: 2,
			},
		};
		assert_eq!(err.kind(), ErrorKind::ExternalDependency);
		let msg = err.to_string();
		assert!(msg.contains(&user_id.to_string()));
		assert!(msg.contains("3 peers restored"));
		assert_eq!(err.gateway_error().and_then(|e| e.verb()), Some(Verb::PeerAdd));
	}

	fn uuid_like() -> UserId {
		keydesk_alloc::new_user_id(&Default::default())
	}
}
