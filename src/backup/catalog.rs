//! Catalog of containers in the backups directory
//!
//! Containers created by the CLI are named `backup-YYYYMMDD-HHMMSS-mmm.gpbk`
//! so that listing can order them without opening each file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{ProfilesError, ProfilesResult};

/// File extension of backup containers
pub const BACKUP_EXTENSION: &str = "gpbk";

/// Metadata about a backup
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Lists and names containers in a backups directory
pub struct BackupCatalog {
    backup_dir: PathBuf,
}

impl BackupCatalog {
    /// Create a catalog over `backup_dir`
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Timestamped path for a new container
    pub fn default_backup_path(&self) -> PathBuf {
        self.backup_path_at(Utc::now())
    }

    fn backup_path_at(&self, now: DateTime<Utc>) -> PathBuf {
        let filename = format!(
            "backup-{}-{:03}.{}",
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis(),
            BACKUP_EXTENSION
        );
        self.backup_dir.join(filename)
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> ProfilesResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        let dir = fs::read_dir(&self.backup_dir)
            .map_err(|e| ProfilesError::io("reading backup directory", &self.backup_dir, e))?;
        for entry in dir {
            let entry = entry
                .map_err(|e| ProfilesError::io("reading backup directory", &self.backup_dir, e))?;

            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == BACKUP_EXTENSION) {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(backups)
    }

    /// Get the most recent backup
    pub fn latest(&self) -> ProfilesResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }

    /// Resolve a CLI argument: `latest` or a path to a container
    pub fn resolve(&self, name: &str) -> ProfilesResult<PathBuf> {
        if name == "latest" {
            return self.latest()?.map(|info| info.path).ok_or_else(|| {
                ProfilesError::Config(format!(
                    "no backups found in {}",
                    self.backup_dir.display()
                ))
            });
        }
        Ok(PathBuf::from(name))
    }
}

/// Parse backup info from a backup file
fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();

    let date_part = filename
        .strip_prefix("backup-")?
        .strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let created_at = parse_backup_timestamp(date_part)?;

    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS` or `YYYYMMDD-HHMMSS-mmm`
fn parse_backup_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = date_str.split('-').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let date_part = parts[0];
    let time_part = parts[1];
    let millis: u32 = match parts.get(2) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };

    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let year: i32 = date_part.get(0..4)?.parse().ok()?;
    let month: u32 = date_part.get(4..6)?.parse().ok()?;
    let day: u32 = date_part.get(6..8)?.parse().ok()?;
    let hour: u32 = time_part.get(0..2)?.parse().ok()?;
    let minute: u32 = time_part.get(2..4)?.parse().ok()?;
    let second: u32 = time_part.get(4..6)?.parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;

    Some(DateTime::from_naive_utc_and_offset(
        NaiveDateTime::new(date, time),
        Utc,
    ))
}
