// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::net::IpAddr;

use thiserror::Error;
use uuid::Uuid;

use crate::protocol::Protocol;

#[derive(Error, Debug)]
pub enum ModelError {
	#[error("invalid brigade id: {0}")]
	InvalidBrigadeId(String),

	#[error("invalid WireGuard public key: {0}")]
	InvalidPublicKey(String),

	#[error("unknown protocol: {0}")]
	UnknownProtocol(String),
}

/// A record that breaks one of the brigade invariants. Always fatal: the
/// record is never committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	#[error("brigade has {0} brigadiers, at most one is allowed")]
	MultipleBrigadiers(usize),

	#[error("brigade has {count} users, limit is {max}")]
	TooManyUsers { count: usize, max: usize },

	#[error("duplicate user id {0}")]
	DuplicateUserId(Uuid),

	#[error("address {addr} is assigned to more than one user")]
	DuplicateAddress { addr: IpAddr },

	#[error("user {user_id} address {addr} is outside the brigade prefix")]
	AddressOutsidePrefix { user_id: Uuid, addr: IpAddr },

	#[error("user {user_id} address {addr} is reserved in the brigade prefix")]
	ReservedAddress { user_id: Uuid, addr: IpAddr },

	#[error("sealed field {field} is missing one custodian copy")]
	UnpairedSecret { field: String },

	#[error("user {0} still carries a pending reconciliation action")]
	PendingAction(Uuid),

	#[error("user {user_id} has {protocol} material but the brigade has it disabled")]
	ProtocolNotEnabled { user_id: Uuid, protocol: Protocol },

	#[error("unsupported record version {found}, newest known is {supported}")]
	UnsupportedVersion { found: u32, supported: u32 },
}
