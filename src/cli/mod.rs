//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup service.

pub mod backup;
pub mod passphrase;

pub use backup::{handle_backup_command, BackupCommands};
pub use passphrase::acquire_password;
