//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ProfilesError, ProfilesResult};

/// Path of the temporary file used while writing `path`
///
/// Lives in the same directory so the final rename never crosses a
/// filesystem boundary.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all. New files
/// are created with `mode` on unix.
pub fn write_bytes_atomic(path: &Path, data: &[u8], mode: u32) -> ProfilesResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ProfilesError::io("creating output directory", parent, e))?;
    }

    let temp_path = temp_path_for(path);

    let result = write_and_sync(&temp_path, data, mode).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| ProfilesError::io("renaming temp file", path, e))
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Write `data` to a freshly created temp file and fsync it
///
/// A leftover temp file from an earlier run is removed first. The file is then
/// opened with `create_new`, which never follows a symlink planted at
/// `temp_path`.
fn write_and_sync(temp_path: &Path, data: &[u8], mode: u32) -> ProfilesResult<()> {
    match fs::remove_file(temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(ProfilesError::io("removing stale temp file", temp_path, e)),
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(temp_path)
        .map_err(|e| ProfilesError::io("creating temp file", temp_path, e))?;
    file.write_all(data)
        .map_err(|e| ProfilesError::io("writing temp file", temp_path, e))?;
    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| ProfilesError::io("syncing temp file", temp_path, e))?;
    Ok(())
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> ProfilesResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path).map_err(|e| ProfilesError::io("opening", path, e))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| ProfilesError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> ProfilesResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let json = serde_json::to_vec_pretty(data)?;
    write_bytes_atomic(path.as_ref(), &json, 0o600)
}
