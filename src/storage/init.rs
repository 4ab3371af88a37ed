//! Storage initialization
//!
//! Handles first-run setup of the profile base directory

use crate::config::paths::ProfilePaths;
use crate::error::ProfilesResult;

use super::file_io::write_bytes_atomic;

/// Initialize the base directory for a fresh installation
///
/// Creates `keys/`, `meta/`, `backups/` and `gpg/`, plus an empty
/// `meta/keys.json`. Existing metadata is never overwritten.
pub fn initialize_storage(paths: &ProfilePaths) -> ProfilesResult<()> {
    paths.ensure_directories()?;

    if !paths.keys_meta_file().exists() {
        write_bytes_atomic(&paths.keys_meta_file(), b"{}", 0o600)?;
    }

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &ProfilePaths) -> bool {
    !paths.is_initialized()
}
