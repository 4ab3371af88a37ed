//! Archive extraction into a destination directory
//!
//! Extraction runs in two passes. The first parses every entry and validates
//! its path, so a hostile entry anywhere in the stream aborts before a single
//! file is written. The second pass writes files in stream order and stops
//! at the first I/O failure; files written before that point are left in
//! place.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{ProfilesError, ProfilesResult};

use super::{ArchiveEntry, ArchiveStream};

/// Outcome of an extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Number of files written
    pub files: usize,
    /// Total content bytes written
    pub bytes: u64,
}

/// Validate an entry path and return it as a clean relative path
///
/// Rejects empty paths, absolute paths, drive prefixes and any `..`
/// segment. `.` segments are dropped.
pub fn sanitize_entry_path(raw: &Path) -> ProfilesResult<PathBuf> {
    let reject = || ProfilesError::PathTraversal {
        path: raw.display().to_string(),
    };

    let mut clean = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(reject())
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(reject());
    }
    Ok(clean)
}

/// Extract every entry of `stream` under `dest_dir`
pub fn extract(stream: &ArchiveStream, dest_dir: &Path) -> ProfilesResult<ExtractSummary> {
    let entries = stream.read_entries()?;

    let planned = entries
        .iter()
        .map(|entry| sanitize_entry_path(&entry.path))
        .collect::<ProfilesResult<Vec<_>>>()?;

    create_private_dir(dest_dir)
        .map_err(|e| ProfilesError::io("creating destination directory", dest_dir, e))?;
    let root = dest_dir
        .canonicalize()
        .map_err(|e| ProfilesError::io("resolving destination directory", dest_dir, e))?;

    let mut summary = ExtractSummary::default();
    for (entry, relative) in entries.iter().zip(planned.iter()) {
        write_entry(&root, relative, entry)?;
        summary.files += 1;
        summary.bytes += entry.size();
    }

    Ok(summary)
}

fn write_entry(root: &Path, relative: &Path, entry: &ArchiveEntry) -> ProfilesResult<()> {
    let context = format!("extracting entry \"{}\"", relative.display());
    let target = root.join(relative);

    if let Some(parent) = target.parent() {
        create_private_dir(parent).map_err(|e| ProfilesError::io(context.as_str(), parent, e))?;
        let resolved = parent
            .canonicalize()
            .map_err(|e| ProfilesError::io(context.as_str(), parent, e))?;
        if !resolved.starts_with(root) {
            return Err(ProfilesError::PathTraversal {
                path: relative.display().to_string(),
            });
        }
    }

    // Never write through a pre-existing link
    if let Ok(meta) = fs::symlink_metadata(&target) {
        if meta.file_type().is_symlink() {
            return Err(ProfilesError::PathTraversal {
                path: relative.display().to_string(),
            });
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&target)
        .map_err(|e| ProfilesError::io(context.as_str(), &target, e))?;
    file.write_all(entry.content.as_bytes())
        .map_err(|e| ProfilesError::io(context.as_str(), &target, e))?;
    file.sync_all()
        .map_err(|e| ProfilesError::io(context.as_str(), &target, e))?;

    set_mode(&target, entry.mode).map_err(|e| ProfilesError::io(context.as_str(), &target, e))?;

    debug!(path = %relative.display(), size = entry.size(), "restored file");
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
