//! User settings for gitprofiles
//!
//! Persists the backup work factor and compression preferences. The values
//! loaded here become an explicit `BackupConfig` handed to each backup or
//! restore call; nothing is kept in global state.

use serde::{Deserialize, Serialize};

use super::paths::ProfilePaths;
use crate::backup::BackupConfig;
use crate::crypto::KdfParams;
use crate::error::{ProfilesError, ProfilesResult};
use crate::storage::file_io::{read_json, write_json_atomic};

/// Backup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    /// scrypt cost parameters for new backups
    #[serde(default)]
    pub kdf: KdfParams,

    /// gzip level, 0-9
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Largest scrypt memory cost accepted from a container on restore, in MiB
    #[serde(default = "default_max_kdf_memory_mib")]
    pub max_kdf_memory_mib: u64,
}

fn default_compression_level() -> u32 {
    6
}

fn default_max_kdf_memory_mib() -> u64 {
    1024
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            compression_level: default_compression_level(),
            max_kdf_memory_mib: default_max_kdf_memory_mib(),
        }
    }
}

/// User settings for gitprofiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Backup preferences
    #[serde(default)]
    pub backup: BackupSettings,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup: BackupSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &ProfilePaths) -> ProfilesResult<Self> {
        // A missing file yields defaults; the caller decides when to persist
        read_json(paths.settings_file()).map_err(|e| match e {
            ProfilesError::Json(msg) => ProfilesError::Config(msg),
            other => other,
        })
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ProfilePaths) -> ProfilesResult<()> {
        write_json_atomic(paths.settings_file(), self)
    }

    /// Build the configuration for a backup or restore call
    ///
    /// The backups directory is always kept out of the archive so that a
    /// backup of the base directory never contains earlier backups.
    pub fn backup_config(&self, paths: &ProfilePaths) -> BackupConfig {
        BackupConfig {
            kdf: self.backup.kdf,
            compression_level: self.backup.compression_level,
            max_kdf_memory: self.backup.max_kdf_memory_mib.saturating_mul(1024 * 1024),
            exclude: vec![paths.backups_dir()],
        }
    }
}
