// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router control API: five verbs, each taking named string parameters and
//! answering `{ code, openvpn_client_certificate? }`.

pub mod error;
pub mod gateway;
pub mod http;
pub mod recording;
pub mod verb;

pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayResponse};
pub use http::HttpGateway;
pub use recording::{RecordedCall, RecordingGateway};
pub use verb::Verb;
