// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a `*ConfigLayer` of optional fields for
//! merging and a resolved `*Config`.

mod domains;
mod gateway;
mod keys;
mod limits;
mod logging;
mod storage;

pub use domains::{DomainsConfig, DomainsConfigLayer};
pub use gateway::{GatewayConfig, GatewayConfigLayer, DEFAULT_GATEWAY_TIMEOUT_SECS};
pub use keys::{KeysConfig, KeysConfigLayer};
pub use limits::{LimitsConfig, LimitsConfigLayer, DEFAULT_MAX_USERS};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use storage::{StorageConfig, StorageConfigLayer, DEFAULT_STORAGE_DIR};
