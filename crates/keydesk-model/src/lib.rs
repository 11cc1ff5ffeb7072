// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistent records of keydesk.
//!
//! A [`Brigade`] is the unit of storage: one WireGuard interface on the
//! gateway, its optional protocol sections, and the [`User`]s issued on it.
//! Every secret inside a record is a [`keydesk_seal::SealedSecret`].
//! [`Brigade::validate`] is the gate every record passes before it is
//! committed to disk.

pub mod brigade;
pub mod counters;
pub mod error;
pub mod ids;
pub mod keys;
pub mod protocol;
pub mod sections;
pub mod user;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use brigade::{Brigade, Message, Subscription, RECORD_VERSION};
pub use counters::{LastActivity, Traffic, TrafficCounters, UserQuota};
pub use error::{ModelError, ValidationError};
pub use ids::{BrigadeId, UserId};
pub use keys::WgPublicKey;
pub use protocol::Protocol;
pub use sections::{
	ExposedPsk, IpsecPeer, IpsecSection, OutlinePeer, OutlineSection, OvcPeer, OvcSection,
	Proto0Peer, Proto0Section, SealedFields, WgPeer,
};
pub use user::{PendingAction, User};
