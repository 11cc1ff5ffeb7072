// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Crash-safe persistence of brigade records.
//!
//! Writers hold an exclusive `flock` for the whole read-modify-commit cycle.
//! A commit is a validated snapshot written to a temporary file and renamed
//! over the record, so the record on disk is always either the old or the new
//! snapshot, never a mix.

pub mod error;
pub mod lock;
pub mod store;

pub use error::{Result, StoreError};
pub use lock::{LockFile, LockMode};
pub use store::{RecordStore, Transaction, LOCK_FILE, RECORD_FILE, TEMP_FILE};
