// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod cli;
pub mod commands;
pub mod context;
pub mod exit;
pub mod output;

pub use cli::Cli;
pub use commands::Command;
pub use context::CliContext;
pub use exit::{exit_code, FullReplayRequired, EXIT_ERROR, EXIT_FULL_REPLAY, EXIT_OK};
pub use output::write_bundle;
