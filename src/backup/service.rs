//! Backup and restore pipeline
//!
//! `backup`: walk → tar → gzip → scrypt (fresh salt) → AES-256-GCM → encode →
//! atomic write. `restore` runs the same stages in reverse and only touches
//! the destination once the container has authenticated.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::archive::{self, ArchiveStream, MAX_COMPRESSION_LEVEL};
use crate::container::{self, ContainerHeader};
use crate::crypto::{self, KdfParams, Password};
use crate::error::{ProfilesError, ProfilesResult};
use crate::storage::file_io::{temp_path_for, write_bytes_atomic};

/// Default ceiling on the scrypt memory cost accepted from a container
pub const DEFAULT_MAX_KDF_MEMORY: u64 = 1024 * 1024 * 1024;

/// Parameters for a single backup or restore call
#[derive(Debug, Clone, PartialEq)]
pub struct BackupConfig {
    /// scrypt cost used when writing a container
    pub kdf: KdfParams,
    /// gzip level, 0-9
    pub compression_level: u32,
    /// Largest `KdfParams::memory_cost` accepted from a container on restore, in bytes
    pub max_kdf_memory: u64,
    /// Paths left out of every archive
    pub exclude: Vec<PathBuf>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            compression_level: 6,
            max_kdf_memory: DEFAULT_MAX_KDF_MEMORY,
            exclude: Vec::new(),
        }
    }
}

impl BackupConfig {
    /// Check the configuration without touching the filesystem
    pub fn validate(&self) -> ProfilesResult<()> {
        self.kdf.validate()?;

        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(ProfilesError::Config(format!(
                "compression level {} out of range (0-{})",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }

        if self.kdf.memory_cost() > self.max_kdf_memory {
            return Err(ProfilesError::Config(format!(
                "scrypt memory cost {} bytes exceeds the configured ceiling of {} bytes",
                self.kdf.memory_cost(),
                self.max_kdf_memory
            )));
        }

        Ok(())
    }
}

/// Result of a backup
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    /// Container written
    pub path: PathBuf,
    /// Number of files archived
    pub entries: usize,
    /// Uncompressed tar stream size
    pub archive_bytes: u64,
    /// Container size on disk
    pub container_bytes: u64,
}

impl BackupReport {
    /// One-line description for the CLI
    pub fn summary(&self) -> String {
        format!(
            "Backed up {} file(s) to {} ({} bytes)",
            self.entries,
            self.path.display(),
            self.container_bytes
        )
    }
}

/// Result of a restore
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    /// Directory files were written into
    pub dest_dir: PathBuf,
    /// Number of files written
    pub files: usize,
    /// Total content bytes written
    pub bytes: u64,
    /// Container format version that was read
    pub version: u8,
}

impl RestoreReport {
    /// One-line description for the CLI
    pub fn summary(&self) -> String {
        format!(
            "Restored {} file(s) ({} bytes) into {}",
            self.files,
            self.bytes,
            self.dest_dir.display()
        )
    }
}

/// Creates and restores password-protected backup containers
#[derive(Debug, Clone)]
pub struct BackupService {
    config: BackupConfig,
}

impl BackupService {
    /// Create a service, rejecting invalid parameters up front
    pub fn new(config: BackupConfig) -> ProfilesResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Back up every regular file under `source_dir` into `out_file`
    ///
    /// `out_file` is replaced atomically; on failure it is left as it was.
    pub fn backup(
        &self,
        source_dir: &Path,
        out_file: &Path,
        password: &Password,
    ) -> ProfilesResult<BackupReport> {
        let source = source_dir
            .canonicalize()
            .map_err(|e| ProfilesError::io("reading source directory", source_dir, e))?;

        // The container may live inside the tree being archived
        let mut exclude: Vec<PathBuf> = self.config.exclude.iter().map(|p| absolute(p)).collect();
        exclude.push(absolute(out_file));
        exclude.push(absolute(&temp_path_for(out_file)));

        info!(source = %source.display(), output = %out_file.display(), "creating backup");

        let entries = archive::collect_entries(&source, &exclude)?;
        let stream = ArchiveStream::from_entries(&entries)?;
        let entry_count = entries.len();
        drop(entries);
        debug!(entries = entry_count, bytes = stream.len(), "archived source tree");

        let compressed = archive::compress(stream.as_bytes(), self.config.compression_level)?;
        let archive_bytes = stream.len() as u64;
        drop(stream);
        debug!(bytes = compressed.len(), "compressed archive");

        let salt = crypto::generate_salt();
        let key = crypto::derive_key(password, &salt, &self.config.kdf)?;
        let header = ContainerHeader::new(salt.to_vec(), self.config.kdf)?;
        let sealed = crypto::seal(&key, &compressed, &header.associated_data()?)?;
        drop(key);
        drop(compressed);

        let bytes = container::encode(&header, &sealed)?;
        write_bytes_atomic(out_file, &bytes, 0o600)?;

        info!(entries = entry_count, bytes = bytes.len(), "backup written");

        Ok(BackupReport {
            path: out_file.to_path_buf(),
            entries: entry_count,
            archive_bytes,
            container_bytes: bytes.len() as u64,
        })
    }

    /// Restore the container at `in_file` into `dest_dir`
    ///
    /// A wrong password and a tampered container are indistinguishable and
    /// both fail before `dest_dir` is created.
    pub fn restore(
        &self,
        in_file: &Path,
        dest_dir: &Path,
        password: &Password,
    ) -> ProfilesResult<RestoreReport> {
        info!(input = %in_file.display(), dest = %dest_dir.display(), "restoring backup");

        let bytes =
            fs::read(in_file).map_err(|e| ProfilesError::io("reading backup", in_file, e))?;
        let (header, sealed) = container::decode(&bytes)?;
        drop(bytes);

        let memory = header.kdf.memory_cost();
        if memory > self.config.max_kdf_memory {
            return Err(ProfilesError::Format(format!(
                "stored scrypt parameters need {} bytes, above the limit of {} bytes",
                memory, self.config.max_kdf_memory
            )));
        }

        let key = crypto::derive_key(password, &header.salt, &header.kdf)?;
        let compressed = crypto::open(&key, &sealed, &header.associated_data()?)?;
        drop(key);
        debug!(bytes = compressed.len(), "container authenticated");

        let stream = ArchiveStream::from_bytes(archive::decompress(&compressed)?);
        drop(compressed);

        let summary = archive::extract(&stream, dest_dir)?;
        info!(files = summary.files, bytes = summary.bytes, "restore complete");

        Ok(RestoreReport {
            dest_dir: dest_dir.to_path_buf(),
            files: summary.files,
            bytes: summary.bytes,
            version: header.version,
        })
    }
}

/// Back up `source_dir` into `dest_file` with an explicit configuration
pub fn backup(
    source_dir: &Path,
    dest_file: &Path,
    password: &Password,
    config: &BackupConfig,
) -> ProfilesResult<BackupReport> {
    BackupService::new(config.clone())?.backup(source_dir, dest_file, password)
}

/// Restore `src_file` into `dest_dir` with an explicit configuration
pub fn restore(
    src_file: &Path,
    dest_dir: &Path,
    password: &Password,
    config: &BackupConfig,
) -> ProfilesResult<RestoreReport> {
    BackupService::new(config.clone())?.restore(src_file, dest_dir, password)
}

/// Resolve `path` the way the walker will see it, even if it does not exist yet
fn absolute(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }

    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
