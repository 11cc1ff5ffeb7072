// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SealError {
	#[error("invalid key length: expected 32 bytes, got {0}")]
	InvalidKeyLength(usize),

	#[error("invalid base64 encoding: {0}")]
	InvalidBase64(#[from] base64::DecodeError),

	#[error("recipient public key is a low-order point")]
	WeakKey,

	#[error("ciphertext too short: {0} bytes")]
	Truncated(usize),

	#[error("sealing failed")]
	Seal,

	#[error("ciphertext could not be opened with this key")]
	Open,

	#[error("plaintext is not valid UTF-8")]
	NotUtf8,
}

pub type Result<T> = std::result::Result<T, SealError>;
