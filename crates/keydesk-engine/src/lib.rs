// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Brigade and user operations for the keydesk.
//!
//! Every mutating operation follows the same shape: take the brigade's
//! exclusive lock, build the new record in memory, push the change to the
//! gateway, then commit. A gateway failure leaves the stored record exactly
//! as it was.
//!
//! ```ignore
//! let keydesk = Keydesk::from_config(&config, gateway);
//! let issued = keydesk.add_user(&brigade_id, NewUser::default()).await?;
//! for file in issued.bundle.files()? {
//!     std::fs::write(out.join(&file.name), file.contents.expose())?;
//! }
//! ```

pub mod error;
pub mod keydesk;
pub mod patch;
pub mod replay;
pub mod sections;
pub mod users;

#[cfg(test)]
mod testing;

pub use error::{ErrorKind, KeydeskError, Result};
pub use keydesk::{IssuedUser, Keydesk, NewBrigade, PatchOutcome, UserSummary};
pub use patch::{apply_patch, PatchSummary};
pub use replay::{replay, ReplayOptions, ReplayReport};
pub use users::NewUser;
