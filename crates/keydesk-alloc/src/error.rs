// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
	#[error("address pool {prefix} is exhausted")]
	Exhausted { prefix: String },
}

pub type Result<T> = std::result::Result<T, AllocError>;
