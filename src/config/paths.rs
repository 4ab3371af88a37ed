//! Path management for gitprofiles
//!
//! ## Path Resolution Order
//!
//! 1. `GITPROFILES_DIR` environment variable (if set and non-empty)
//! 2. `~/.ssh/git_profiles`

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::{ProfilesError, ProfilesResult};

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "GITPROFILES_DIR";

/// Manages all paths used by gitprofiles
#[derive(Debug, Clone)]
pub struct ProfilePaths {
    /// Base directory for all profile data
    base_dir: PathBuf,
}

impl ProfilePaths {
    /// Create a new ProfilePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> ProfilesResult<Self> {
        let base_dir = match std::env::var(BASE_DIR_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create ProfilePaths with a custom base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.ssh/git_profiles/ or override)
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Private and public key files
    pub fn keys_dir(&self) -> PathBuf {
        self.base_dir.join("keys")
    }

    /// Profile metadata
    pub fn meta_dir(&self) -> PathBuf {
        self.base_dir.join("meta")
    }

    /// Encrypted backup containers
    pub fn backups_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// GPG material
    pub fn gpg_dir(&self) -> PathBuf {
        self.base_dir.join("gpg")
    }

    /// Get the path to meta/keys.json
    pub fn keys_meta_file(&self) -> PathBuf {
        self.meta_dir().join("keys.json")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Ensure all required directories exist, private to the owner on unix
    pub fn ensure_directories(&self) -> ProfilesResult<()> {
        for dir in [
            self.base_dir.clone(),
            self.keys_dir(),
            self.meta_dir(),
            self.backups_dir(),
            self.gpg_dir(),
        ] {
            create_private_dir(&dir)
                .map_err(|e| ProfilesError::io("creating directory", &dir, e))?;
        }
        Ok(())
    }

    /// Check if the base directory has been initialized
    pub fn is_initialized(&self) -> bool {
        self.keys_meta_file().exists()
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

fn resolve_default_path() -> ProfilesResult<PathBuf> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| ProfilesError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join(".ssh").join("git_profiles"))
}
