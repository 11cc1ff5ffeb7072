// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential generators for the five tunnel protocols.
//!
//! Each generator turns a [`UserSeed`] into three things: a client config for
//! the end user (never stored), its share of the router-facing
//! [`GatewayParams`], and the sealed material persisted on the user record.
//! [`generate_user`] runs every generator the brigade has enabled.

pub mod bundle;
pub mod error;
pub mod generator;
pub mod ipsec;
pub mod outline;
pub mod ovc;
pub mod params;
pub mod proto0;
mod random;
pub mod sections;
pub mod user;
pub mod wireguard;

pub use bundle::{amnezia, BundleFile, ClientBundle};
pub use error::{ProtocolError, Result};
pub use generator::{Generated, ProtocolGenerator, UserSeed};
pub use params::{
	interface_params, peer_del_params, peer_params, stat_params, wg_del_params, GatewayParams,
};
pub use sections::{enable, reset_domain, reset_port, DomainPool};
pub use user::{extend_user, generate_section, generate_user, regenerate_user, GeneratedUser};
pub use wireguard::new_interface_keys;
