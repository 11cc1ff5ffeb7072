// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use keydesk_model::{Brigade, BrigadeId};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StoreError};
use crate::lock::{LockFile, LockMode};

pub const RECORD_FILE: &str = "brigade.json";
pub const TEMP_FILE: &str = "brigade.json.tmp";
pub const LOCK_FILE: &str = "brigade.lock";

#[derive(Debug, Clone)]
struct RecordPaths {
	dir: PathBuf,
	primary: PathBuf,
	temp: PathBuf,
	lock: PathBuf,
}

impl RecordPaths {
	fn new(root: &Path, id: &BrigadeId) -> Self {
		let dir = root.join(id.to_string());
		Self {
			primary: dir.join(RECORD_FILE),
			temp: dir.join(TEMP_FILE),
			lock: dir.join(LOCK_FILE),
			dir,
		}
	}
}

/// One directory per brigade under `root`, each holding a JSON record, a
/// temporary file that only exists during commit, and a lock file.
#[derive(Debug, Clone)]
pub struct RecordStore {
	root: PathBuf,
	max_users: usize,
}

impl RecordStore {
	pub fn new(root: impl Into<PathBuf>, max_users: usize) -> Self {
		Self {
			root: root.into(),
			max_users,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn max_users(&self) -> usize {
		self.max_users
	}

	pub fn record_path(&self, id: &BrigadeId) -> PathBuf {
		RecordPaths::new(&self.root, id).primary
	}

	pub fn exists(&self, id: &BrigadeId) -> bool {
		RecordPaths::new(&self.root, id).primary.exists()
	}

	/// Read the committed record without taking the lock. Commits replace the
	/// file by rename, so a reader always sees one complete snapshot.
	#[instrument(skip(self), fields(brigade_id = %id))]
	pub fn open_for_read(&self, id: &BrigadeId) -> Result<Brigade> {
		let paths = RecordPaths::new(&self.root, id);
		read_record(&paths, id)
	}

	#[instrument(skip(self), fields(brigade_id = %id))]
	pub fn open_for_modify(&self, id: &BrigadeId) -> Result<(Transaction, Brigade)> {
		self.modify(id, LockMode::Block)
	}

	/// Like [`RecordStore::open_for_modify`] but fails with
	/// [`StoreError::Busy`] instead of waiting for another writer.
	#[instrument(skip(self), fields(brigade_id = %id))]
	pub fn try_open_for_modify(&self, id: &BrigadeId) -> Result<(Transaction, Brigade)> {
		self.modify(id, LockMode::NonBlocking)
	}

	fn modify(&self, id: &BrigadeId, mode: LockMode) -> Result<(Transaction, Brigade)> {
		let paths = RecordPaths::new(&self.root, id);
		if !paths.primary.exists() {
			return Err(StoreError::NotFound(*id));
		}

		let lock = LockFile::acquire(&paths.lock, mode)
			.map_err(|e| StoreError::io(&paths.lock, e))?
			.ok_or(StoreError::Busy(*id))?;

		let txn = Transaction::new(*id, paths, lock, self.max_users);
		let brigade = read_record(&txn.paths, id)?;
		Ok((txn, brigade))
	}

	#[instrument(skip(self), fields(brigade_id = %id))]
	pub fn open_for_create(&self, id: &BrigadeId) -> Result<Transaction> {
		let paths = RecordPaths::new(&self.root, id);
		fs::create_dir_all(&paths.dir).map_err(|e| StoreError::io(&paths.dir, e))?;

		let lock = LockFile::acquire(&paths.lock, LockMode::Block)
			.map_err(|e| StoreError::io(&paths.lock, e))?
			.ok_or(StoreError::Busy(*id))?;

		if paths.primary.exists() {
			return Err(StoreError::AlreadyExists(*id));
		}

		Ok(Transaction::new(*id, paths, lock, self.max_users))
	}

	/// Ids of every brigade with a committed record.
	pub fn list(&self) -> Result<Vec<BrigadeId>> {
		let entries = match fs::read_dir(&self.root) {
			Ok(entries) => entries,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StoreError::io(&self.root, e)),
		};

		let mut ids = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
			let name = entry.file_name();
			let Some(name) = name.to_str() else {
				continue;
			};
			match name.parse::<BrigadeId>() {
				Ok(id) if entry.path().join(RECORD_FILE).exists() => ids.push(id),
				Ok(_) => {}
				Err(_) => debug!(entry = name, "skipping non-brigade directory entry"),
			}
		}
		ids.sort();
		Ok(ids)
	}
}

fn read_record(paths: &RecordPaths, id: &BrigadeId) -> Result<Brigade> {
	let bytes = match fs::read(&paths.primary) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(*id)),
		Err(e) => return Err(StoreError::io(&paths.primary, e)),
	};

	let brigade: Brigade = serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
		path: paths.primary.clone(),
		source,
	})?;

	if brigade.brigade_id != *id {
		return Err(StoreError::IdMismatch {
			path: paths.primary.clone(),
			expected: *id,
			found: brigade.brigade_id,
		});
	}
	// The user limit is configuration and may have been lowered since the
	// record was written; every other invariant must already hold.
	brigade.validate(usize::MAX)?;

	Ok(brigade)
}

/// Exclusive hold on one brigade record.
///
/// The lock is released by [`Transaction::commit`], [`Transaction::close`],
/// [`Transaction::destroy`] or on drop, whichever comes first. Dropping an
/// uncommitted transaction leaves the record untouched.
#[derive(Debug)]
pub struct Transaction {
	id: BrigadeId,
	paths: RecordPaths,
	lock: Option<LockFile>,
	max_users: usize,
}

impl Transaction {
	fn new(id: BrigadeId, paths: RecordPaths, lock: LockFile, max_users: usize) -> Self {
		Self {
			id,
			paths,
			lock: Some(lock),
			max_users,
		}
	}

	pub fn brigade_id(&self) -> &BrigadeId {
		&self.id
	}

	pub fn is_open(&self) -> bool {
		self.lock.is_some()
	}

	/// Validate `brigade`, write it to the temporary file, fsync, rename it over
	/// the record and fsync the directory. The lock is released afterwards.
	#[instrument(skip(self, brigade), fields(brigade_id = %self.id, users = brigade.users.len()))]
	pub fn commit(&mut self, brigade: &Brigade) -> Result<()> {
		if self.lock.is_none() {
			return Err(StoreError::Closed);
		}
		if brigade.brigade_id != self.id {
			return Err(StoreError::IdMismatch {
				path: self.paths.primary.clone(),
				expected: self.id,
				found: brigade.brigade_id,
			});
		}
		brigade.validate(self.max_users)?;

		let contents = serde_json::to_vec_pretty(brigade).map_err(|source| StoreError::Encode {
			id: self.id,
			source,
		})?;

		write_private(&self.paths.temp, &contents)?;
		fs::rename(&self.paths.temp, &self.paths.primary)
			.map_err(|e| StoreError::io(&self.paths.primary, e))?;
		sync_dir(&self.paths.dir)?;

		info!("brigade record committed");
		self.close();
		Ok(())
	}

	/// Discard the transaction. Safe to call more than once.
	pub fn close(&mut self) {
		if let Some(lock) = self.lock.take() {
			match fs::remove_file(&self.paths.temp) {
				Ok(()) => debug!(path = ?self.paths.temp, "removed stale temporary file"),
				Err(e) if e.kind() == io::ErrorKind::NotFound => {}
				Err(e) => warn!(path = ?self.paths.temp, error = %e, "failed to remove temporary file"),
			}
			drop(lock);
		}
	}

	/// Remove the brigade's record and directory, then release the lock.
	#[instrument(skip(self), fields(brigade_id = %self.id))]
	pub fn destroy(mut self) -> Result<()> {
		if self.lock.is_none() {
			return Err(StoreError::Closed);
		}
		for path in [&self.paths.primary, &self.paths.temp] {
			match fs::remove_file(path) {
				Ok(()) => {}
				Err(e) if e.kind() == io::ErrorKind::NotFound => {}
				Err(e) => return Err(StoreError::io(path, e)),
			}
		}
		sync_dir(&self.paths.dir)?;
		fs::remove_dir_all(&self.paths.dir).map_err(|e| StoreError::io(&self.paths.dir, e))?;

		info!("brigade record destroyed");
		self.close();
		Ok(())
	}
}

impl Drop for Transaction {
	fn drop(&mut self) {
		self.close();
	}
}

fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
	let mut options = OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}

	let mut file = options.open(path).map_err(|e| StoreError::io(path, e))?;
	file.write_all(contents).map_err(|e| StoreError::io(path, e))?;
	file.sync_all().map_err(|e| StoreError::io(path, e))?;
	Ok(())
}

fn sync_dir(dir: &Path) -> Result<()> {
	File::open(dir)
		.and_then(|d| d.sync_all())
		.map_err(|e| StoreError::io(dir, e))
}
