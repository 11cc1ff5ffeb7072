// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process exit codes.

use keydesk_engine::KeydeskError;
use thiserror::Error;

pub const EXIT_OK: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
/// A patch touched brigade-level fields and was not forced.
pub const EXIT_FULL_REPLAY: u8 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("brigade-level fields changed ({}); rerun with --force to replace and replay", .changed.join(", "))]
pub struct FullReplayRequired {
	pub changed: Vec<&'static str>,
}

pub fn exit_code(err: &anyhow::Error) -> u8 {
	if err.downcast_ref::<FullReplayRequired>().is_some() {
		return EXIT_FULL_REPLAY;
	}
	if let Some(e) = err.downcast_ref::<KeydeskError>() {
		tracing::debug!(kind = %e.kind(), "operation failed");
	}
	EXIT_ERROR
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::Context;

	#[test]
	fn full_replay_maps_to_three() {
		let err = anyhow::Error::new(FullReplayRequired {
			changed: vec!["endpoint_port"],
		});
		assert_eq!(exit_code(&err), EXIT_FULL_REPLAY);
		assert!(err.to_string().contains("endpoint_port"));
	}

	#[test]
	fn context_does_not_hide_the_code() {
		let err = Err::<(), _>(FullReplayRequired { changed: vec![] })
			.context("patch failed")
			.unwrap_err();
		assert_eq!(exit_code(&err), EXIT_FULL_REPLAY);
	}

	#[test]
	fn everything_else_is_one() {
		let err = anyhow::Error::new(KeydeskError::UserNotFound(keydesk_model::UserId::nil()));
		assert_eq!(exit_code(&err), EXIT_ERROR);
		assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_ERROR);
	}
}
