//! Backup CLI commands
//!
//! Implements CLI commands for creating, restoring and inspecting backups.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::Subcommand;
use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger, Operation, Outcome};
use crate::backup::{BackupCatalog, BackupService};
use crate::config::paths::ProfilePaths;
use crate::config::settings::Settings;
use crate::container;
use crate::error::ProfilesResult;

use super::passphrase::{acquire_password, PASSWORD_FILE_ENV};

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new encrypted backup
    Create {
        /// Directory to back up (defaults to the base directory)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Container to write (defaults to backups/backup-<timestamp>.gpbk)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read the password from a file instead of prompting
        #[arg(long, env = PASSWORD_FILE_ENV)]
        password_file: Option<PathBuf>,
    },

    /// Restore a backup into a directory
    Restore {
        /// Backup path (use 'latest' for most recent)
        backup: String,

        /// Directory to restore into
        #[arg(short, long)]
        dest: PathBuf,

        /// Read the password from a file instead of prompting
        #[arg(long, env = PASSWORD_FILE_ENV)]
        password_file: Option<PathBuf>,
    },

    /// Show the header of a backup without decrypting it
    Info {
        /// Backup path (use 'latest' for most recent)
        backup: String,
    },

    /// List all available backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show recent backup and restore operations
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &ProfilePaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> ProfilesResult<()> {
    let catalog = BackupCatalog::new(paths.backups_dir());

    match cmd {
        BackupCommands::Create {
            source,
            output,
            password_file,
        } => {
            let service = BackupService::new(settings.backup_config(paths))?;
            let source = source.unwrap_or_else(|| paths.base_dir().to_path_buf());
            let output = output.unwrap_or_else(|| catalog.default_backup_path());

            let password = acquire_password(password_file.as_deref(), true)?;

            println!("Creating backup of {}...", source.display());
            let result = service.backup(&source, &output, &password);
            drop(password);

            record(
                paths,
                Operation::Backup,
                &output,
                &source,
                result.as_ref().map(|r| r.entries),
            );

            let report = result?;
            println!("{}", report.summary());
        }

        BackupCommands::Restore {
            backup,
            dest,
            password_file,
        } => {
            let service = BackupService::new(settings.backup_config(paths))?;
            let backup_path = catalog.resolve(&backup)?;

            let password = acquire_password(password_file.as_deref(), false)?;

            println!("Restoring {}...", backup_path.display());
            let result = service.restore(&backup_path, &dest, &password);
            drop(password);

            record(
                paths,
                Operation::Restore,
                &backup_path,
                &dest,
                result.as_ref().map(|r| r.files),
            );

            let report = result?;
            println!("{}", report.summary());
        }

        BackupCommands::Info { backup } => {
            let backup_path = catalog.resolve(&backup)?;
            let (header, size) = container::inspect(&backup_path)?;

            println!("Backup Details");
            println!("==============");
            println!("File:        {}", backup_path.display());
            println!("Size:        {}", format_size(size));
            println!("Version:     {}", header.version);
            println!("Salt:        {}", BASE64.encode(&header.salt));
            println!(
                "scrypt:      N={} r={} p={}",
                header.kdf.n, header.kdf.r, header.kdf.p
            );
            println!("KDF memory:  {}", format_size(header.kdf.memory_cost()));
        }

        BackupCommands::List { verbose } => {
            let backups = catalog.list_backups()?;

            if backups.is_empty() {
                println!("No backups found.");
                println!("Create one with: gitprofiles backup create");
                return Ok(());
            }

            println!("Available Backups");
            println!("=================");
            println!();

            for (i, backup) in backups.iter().enumerate() {
                let age = chrono::Utc::now().signed_duration_since(backup.created_at);

                if verbose {
                    println!(
                        "{}. {}\n   Created: {}\n   Size: {}\n   Age: {}\n",
                        i + 1,
                        backup.filename,
                        backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        format_size(backup.size_bytes),
                        format_duration(age),
                    );
                } else {
                    println!(
                        "  {}. {} ({} ago, {})",
                        i + 1,
                        backup.filename,
                        format_duration(age),
                        format_size(backup.size_bytes),
                    );
                }
            }

            println!();
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::History { limit } => {
            let logger = AuditLogger::new(paths.audit_log());
            let entries = logger.read_recent(limit)?;

            if entries.is_empty() {
                println!("No backup history.");
                return Ok(());
            }

            for entry in entries.iter().rev() {
                println!("{}", entry.format_human_readable());
            }
        }
    }

    Ok(())
}

/// Append an audit entry; a failure here never masks the operation's result
fn record(
    paths: &ProfilePaths,
    operation: Operation,
    container: &Path,
    directory: &Path,
    result: Result<usize, &crate::error::ProfilesError>,
) {
    let outcome = match result {
        Ok(files) => Outcome::Success { files },
        Err(e) => Outcome::Failure {
            error: e.to_string(),
        },
    };

    let entry = AuditEntry::new(operation, container, directory, outcome);
    if let Err(e) = AuditLogger::new(paths.audit_log()).log(&entry) {
        warn!(error = %e, "could not write audit log");
    }
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(32 * 1024 * 1024), "32.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::minutes(5)), "5m");
        assert_eq!(format_duration(chrono::Duration::hours(3)), "3h");
        assert_eq!(format_duration(chrono::Duration::days(2)), "2d");
        assert_eq!(format_duration(chrono::Duration::days(65)), "2mo");
    }
}
