//! Backup system for gitprofiles
//!
//! Packs a directory tree into a single password-protected container and
//! restores it.
//!
//! # Architecture
//!
//! - `BackupService`: runs the archive → compress → derive → seal → encode
//!   pipeline and its reverse
//! - `BackupCatalog`: names, lists and resolves containers in the backups
//!   directory
//!
//! # Example
//!
//! ```rust,ignore
//! use gitprofiles::backup::{BackupConfig, BackupService};
//! use gitprofiles::crypto::Password;
//!
//! let service = BackupService::new(BackupConfig::default())?;
//! let password = Password::from("password123");
//!
//! let report = service.backup(&base_dir, &out_file, &password)?;
//! println!("{}", report.summary());
//!
//! // Later, restore into a fresh directory
//! let restored = service.restore(&out_file, &dest_dir, &password)?;
//! println!("{}", restored.summary());
//! ```

mod catalog;
mod service;

pub use catalog::{BackupCatalog, BackupInfo, BACKUP_EXTENSION};
pub use service::{
    backup, restore, BackupConfig, BackupReport, BackupService, RestoreReport,
    DEFAULT_MAX_KDF_MEMORY,
};
