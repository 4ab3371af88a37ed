//! Directory tree archiving
//!
//! Turns a directory of regular files into a single ordered tar stream and
//! back. Directories are implied by entry paths; symlinks and special files
//! are never archived.
//!
//! # Determinism
//!
//! Entries are sorted by relative path and every header carries zeroed
//! ownership and timestamps, so identical trees produce identical streams.
//!
//! # Extraction safety
//!
//! All entry paths are validated before anything is written. An entry with a
//! parent-directory segment, an absolute path or a drive prefix aborts the
//! whole extraction with `ProfilesError::PathTraversal`.

mod compress;
mod create;
mod extract;

pub use compress::{compress, decompress, MAX_COMPRESSION_LEVEL};
pub use create::{collect_entries, create};
pub use extract::{extract, sanitize_entry_path, ExtractSummary};

use std::path::{Path, PathBuf};

use crate::crypto::SecureBytes;
use crate::error::{ProfilesError, ProfilesResult};

/// A single regular file in an archive
#[derive(Debug)]
pub struct ArchiveEntry {
    /// Path relative to the archived root
    pub path: PathBuf,
    /// Unix permission bits
    pub mode: u32,
    /// File content
    pub content: SecureBytes,
}

impl ArchiveEntry {
    /// Create a new entry
    pub fn new(path: impl Into<PathBuf>, mode: u32, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            mode,
            content: SecureBytes::new(content),
        }
    }

    /// Content length in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Size of a tar header and of the blocks content is padded to
const BLOCK_SIZE: usize = 512;

/// Paths at least this long need a GNU long-name entry
const GNU_NAME_LIMIT: usize = 100;

fn padded(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Bytes `from_entries` writes for one entry
fn entry_stream_size(path: &Path, content_len: usize) -> usize {
    let path_len = path.as_os_str().len();
    let long_name = if path_len >= GNU_NAME_LIMIT {
        BLOCK_SIZE + padded(path_len + 1)
    } else {
        0
    };
    long_name + BLOCK_SIZE + padded(content_len)
}

/// An uncompressed tar stream held in zeroize-on-drop memory
///
/// The buffer is sized up front from the entry list so it is never
/// reallocated while plaintext is being written into it.
#[derive(Debug)]
pub struct ArchiveStream {
    bytes: SecureBytes,
}

impl ArchiveStream {
    /// Serialize entries, in the given order, into a tar stream
    pub fn from_entries(entries: &[ArchiveEntry]) -> ProfilesResult<Self> {
        // Two zero blocks end the archive
        let capacity = entries
            .iter()
            .map(|e| entry_stream_size(&e.path, e.content.len()))
            .sum::<usize>()
            + 2 * BLOCK_SIZE;
        let mut builder = tar::Builder::new(SecureBytes::with_capacity(capacity));

        for entry in entries {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(entry.size());
            header.set_mode(entry.mode & 0o7777);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);

            builder
                .append_data(&mut header, &entry.path, entry.content.as_bytes())
                .map_err(|e| {
                    ProfilesError::Format(format!(
                        "archiving entry \"{}\": {}",
                        entry.path.display(),
                        e
                    ))
                })?;
        }

        let bytes = builder
            .into_inner()
            .map_err(|e| ProfilesError::Format(format!("finishing archive: {}", e)))?;

        Ok(Self { bytes })
    }

    /// Wrap an existing tar stream
    pub fn from_bytes(bytes: SecureBytes) -> Self {
        Self { bytes }
    }

    /// Parse the stream back into entries
    ///
    /// Paths are returned as stored; callers writing to disk must pass them
    /// through `sanitize_entry_path`. Directory entries are skipped and any
    /// other non-regular entry is a format error.
    pub fn read_entries(&self) -> ProfilesResult<Vec<ArchiveEntry>> {
        let mut archive = tar::Archive::new(self.bytes.as_bytes());
        let mut entries = Vec::new();

        let iter = archive
            .entries()
            .map_err(|e| ProfilesError::Format(format!("reading archive: {}", e)))?;

        for entry in iter {
            let mut entry =
                entry.map_err(|e| ProfilesError::Format(format!("reading archive entry: {}", e)))?;

            let path = entry
                .path()
                .map_err(|e| ProfilesError::Format(format!("invalid entry path: {}", e)))?
                .into_owned();

            match entry.header().entry_type() {
                tar::EntryType::Regular | tar::EntryType::Continuous => {}
                tar::EntryType::Directory => continue,
                other => {
                    return Err(ProfilesError::Format(format!(
                        "unsupported entry type {:?} for \"{}\"",
                        other,
                        path.display()
                    )))
                }
            }

            let mode = entry.header().mode().map_err(|e| {
                ProfilesError::Format(format!("invalid mode for \"{}\": {}", path.display(), e))
            })?;

            // The stored size is untrusted, so never reserve more than the stream holds
            let size = usize::try_from(entry.size()).unwrap_or(usize::MAX);
            let mut content = SecureBytes::with_capacity(size.min(self.bytes.len()));
            content.read_from(&mut entry).map_err(|e| {
                ProfilesError::Format(format!("reading content of \"{}\": {}", path.display(), e))
            })?;

            entries.push(ArchiveEntry { path, mode, content });
        }

        Ok(entries)
    }

    /// Get the raw tar bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    /// Length of the stream in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the stream is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_survive_stream() {
        let entries = vec![
            ArchiveEntry::new("keys/a", 0o600, b"secret".to_vec()),
            ArchiveEntry::new("meta/keys.json", 0o644, b"{}".to_vec()),
        ];

        let stream = ArchiveStream::from_entries(&entries).unwrap();
        let parsed = stream.read_entries().unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].path, PathBuf::from("keys/a"));
        assert_eq!(parsed[0].mode, 0o600);
        assert_eq!(parsed[0].content.as_bytes(), b"secret");
        assert_eq!(parsed[1].path, PathBuf::from("meta/keys.json"));
        assert_eq!(parsed[1].mode, 0o644);
        assert_eq!(parsed[1].size(), 2);
    }

    #[test]
    fn test_same_entries_same_bytes() {
        let make = || {
            vec![
                ArchiveEntry::new("a", 0o600, b"1".to_vec()),
                ArchiveEntry::new("b/c", 0o600, b"2".to_vec()),
            ]
        };
        let s1 = ArchiveStream::from_entries(&make()).unwrap();
        let s2 = ArchiveStream::from_entries(&make()).unwrap();
        assert_eq!(s1.as_bytes(), s2.as_bytes());
    }

    #[test]
    fn test_long_paths() {
        let long = format!("{}/file", "d".repeat(150));
        let entries = vec![ArchiveEntry::new(long.as_str(), 0o600, b"x".to_vec())];

        let stream = ArchiveStream::from_entries(&entries).unwrap();
        let parsed = stream.read_entries().unwrap();
        assert_eq!(parsed[0].path, PathBuf::from(long));
    }

    #[test]
    fn test_stream_buffer_sized_exactly() {
        let entries = vec![
            ArchiveEntry::new("keys/a", 0o600, vec![0x5A; 1300]),
            ArchiveEntry::new("meta/keys.json", 0o644, b"{}".to_vec()),
            ArchiveEntry::new("empty", 0o600, Vec::new()),
        ];

        let stream = ArchiveStream::from_entries(&entries).unwrap();
        assert_eq!(stream.bytes.capacity(), stream.len());
        assert_eq!(stream.len(), 512 + 1536 + 512 + 512 + 512 + 1024);
    }

    #[test]
    fn test_long_path_buffer_never_regrows() {
        let long = format!("{}/file", "d".repeat(150));
        let entries = vec![ArchiveEntry::new(long.as_str(), 0o600, b"x".to_vec())];

        let stream = ArchiveStream::from_entries(&entries).unwrap();
        assert!(stream.bytes.capacity() >= stream.len());
        assert!(stream.bytes.capacity() < stream.len() + BLOCK_SIZE);
    }

    #[test]
    fn test_parsed_content_sized_exactly() {
        let entries = vec![ArchiveEntry::new("keys/a", 0o600, vec![0x5A; 20_000])];
        let stream = ArchiveStream::from_entries(&entries).unwrap();

        let parsed = stream.read_entries().unwrap();
        assert_eq!(parsed[0].content.len(), 20_000);
        assert_eq!(parsed[0].content.capacity(), 20_000);
    }

    #[test]
    fn test_empty_archive() {
        let stream = ArchiveStream::from_entries(&[]).unwrap();
        assert!(!stream.is_empty()); // end-of-archive blocks
        assert!(stream.read_entries().unwrap().is_empty());
    }

    #[test]
    fn test_symlink_entry_rejected() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        builder
            .append_link(&mut header, "link", "/etc/passwd")
            .unwrap();
        let bytes = builder.into_inner().unwrap();

        let stream = ArchiveStream::from_bytes(SecureBytes::new(bytes));
        let err = stream.read_entries().unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_garbage_is_format_error() {
        let stream = ArchiveStream::from_bytes(SecureBytes::new(vec![0x41; 700]));
        assert!(stream.read_entries().unwrap_err().is_format());
    }
}
