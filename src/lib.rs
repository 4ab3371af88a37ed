//! gitprofiles - Git identity profiles with encrypted backups
//!
//! This library provides the backup engine behind the `gitprofiles` CLI. A
//! profile base directory (`~/.ssh/git_profiles` by default) holding SSH keys,
//! GPG material and profile metadata is packed into a single
//! password-protected container and restored from it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `archive`: Deterministic tar archiving, gzip and safe extraction
//! - `crypto`: scrypt key derivation, AES-256-GCM sealing, zeroizing buffers
//! - `container`: The `GPBK` container byte format
//! - `backup`: The backup/restore pipeline and the backups catalog
//! - `config`: Path resolution and user settings
//! - `storage`: Atomic file writes and first-run setup
//! - `audit`: Append-only log of backup and restore operations
//! - `cli`: Command handlers for the binary
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use gitprofiles::{backup, restore, BackupConfig, Password};
//!
//! let config = BackupConfig::default();
//! let password = Password::from("password123");
//!
//! backup(&base_dir, &out_file, &password, &config)?;
//! restore(&out_file, &dest_dir, &password, &config)?;
//! ```

pub mod archive;
pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod storage;

pub use backup::{backup, restore, BackupConfig, BackupReport, BackupService, RestoreReport};
pub use crypto::{KdfParams, Password};
pub use error::{ProfilesError, ProfilesResult};
