// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Advisory exclusive lock on a companion file.
//!
//! The lock lives on its own file rather than on the record: commit renames
//! a fresh file over the record, which would leave a lock on the old inode.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::trace;

#[derive(Debug)]
pub struct LockFile {
	file: File,
	path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
	Block,
	NonBlocking,
}

impl LockFile {
	/// Open (creating if needed) and lock `path`. In non-blocking mode a held
	/// lock yields `Ok(None)`.
	pub fn acquire(path: &Path, mode: LockMode) -> io::Result<Option<Self>> {
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(false)
			.open(path)?;

		let op = match mode {
			LockMode::Block => libc::LOCK_EX,
			LockMode::NonBlocking => libc::LOCK_EX | libc::LOCK_NB,
		};

		loop {
			// SAFETY: the descriptor is owned by `file` and stays open for the call.
			let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
			if rc == 0 {
				break;
			}
			let err = io::Error::last_os_error();
			match err.kind() {
				io::ErrorKind::Interrupted => continue,
				io::ErrorKind::WouldBlock if mode == LockMode::NonBlocking => return Ok(None),
				_ => return Err(err),
			}
		}

		trace!(path = ?path, "lock acquired");
		Ok(Some(Self {
			file,
			path: path.to_path_buf(),
		}))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Drop for LockFile {
	fn drop(&mut self) {
		// SAFETY: as above. Closing the descriptor would release the lock too;
		// unlocking first makes the release point explicit.
		unsafe {
			libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
		}
		trace!(path = ?self.path, "lock released");
	}
}
