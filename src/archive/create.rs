//! Archive creation from a directory tree

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ProfilesError, ProfilesResult};

use super::{ArchiveEntry, ArchiveStream};

/// Mode recorded for files on platforms without unix permission bits
#[cfg(not(unix))]
const DEFAULT_MODE: u32 = 0o600;

/// Archive every regular file under `source_dir`
///
/// Paths equal to or beneath any entry of `exclude` are skipped.
pub fn create(source_dir: &Path, exclude: &[PathBuf]) -> ProfilesResult<ArchiveStream> {
    let entries = collect_entries(source_dir, exclude)?;
    ArchiveStream::from_entries(&entries)
}

/// Walk `source_dir` and read every regular file into memory, sorted by path
pub fn collect_entries(
    source_dir: &Path,
    exclude: &[PathBuf],
) -> ProfilesResult<Vec<ArchiveEntry>> {
    let metadata = fs::metadata(source_dir)
        .map_err(|e| ProfilesError::io("reading source directory", source_dir, e))?;
    if !metadata.is_dir() {
        return Err(ProfilesError::io(
            "reading source directory",
            source_dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut entries = Vec::new();

    let walker = WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !exclude.iter().any(|x| e.path().starts_with(x)));

    for item in walker {
        let item = item.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source_dir.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
            ProfilesError::io("walking source directory", path, source)
        })?;

        let file_type = item.file_type();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            warn!(path = %item.path().display(), "skipping non-regular file");
            continue;
        }

        let relative = match relative_path(source_dir, item.path()) {
            Some(rel) => rel,
            None => {
                warn!(path = %item.path().display(), "skipping entry outside source directory");
                continue;
            }
        };

        let content =
            fs::read(item.path()).map_err(|e| ProfilesError::io("reading file", item.path(), e))?;
        let meta = item
            .metadata()
            .map_err(|e| ProfilesError::io("reading file metadata", item.path(), e.into()))?;

        debug!(path = %relative.display(), size = content.len(), "archiving file");
        entries.push(ArchiveEntry::new(relative, file_mode(&meta), content));
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Relative path of `path` under `root`, if it is made only of normal components
fn relative_path(root: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    if rel.components().all(|c| matches!(c, Component::Normal(_))) {
        Some(rel.to_path_buf())
    } else {
        None
    }
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> u32 {
    DEFAULT_MODE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keys")).unwrap();
        fs::create_dir_all(root.join("meta")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("keys").join("b"), "second").unwrap();
        fs::write(root.join("keys").join("a"), "secret").unwrap();
        fs::write(root.join("meta").join("keys.json"), "{}").unwrap();
        temp_dir
    }

    #[test]
    fn test_collects_regular_files_sorted() {
        let tree = sample_tree();
        let entries = collect_entries(tree.path(), &[]).unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("keys/a"),
                PathBuf::from("keys/b"),
                PathBuf::from("meta/keys.json"),
            ]
        );
        assert_eq!(entries[0].content.as_bytes(), b"secret");
    }

    #[test]
    fn test_identical_trees_identical_streams() {
        let t1 = sample_tree();
        let t2 = sample_tree();

        let s1 = create(t1.path(), &[]).unwrap();
        let s2 = create(t2.path(), &[]).unwrap();

        assert_eq!(s1.as_bytes(), s2.as_bytes());
    }

    #[test]
    fn test_exclude_prunes_subtree() {
        let tree = sample_tree();
        fs::create_dir_all(tree.path().join("backups")).unwrap();
        fs::write(tree.path().join("backups").join("old.gpbk"), "x").unwrap();

        let exclude = vec![tree.path().join("backups")];
        let entries = collect_entries(tree.path(), &exclude).unwrap();

        assert!(entries.iter().all(|e| !e.path.starts_with("backups")));
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = collect_entries(&temp_dir.path().join("nope"), &[]).unwrap_err();
        assert!(matches!(err, ProfilesError::Io { .. }));
    }

    #[test]
    fn test_source_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(collect_entries(&file, &[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_archived() {
        let tree = sample_tree();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("target"), "outside").unwrap();
        let target = outside.path().join("target");
        std::os::unix::fs::symlink(&target, tree.path().join("link")).unwrap();
        std::os::unix::fs::symlink(outside.path(), tree.path().join("linkdir")).unwrap();

        let entries = collect_entries(tree.path(), &[]).unwrap();
        assert!(entries.iter().all(|e| !e.path.starts_with("link")));
        assert!(entries.iter().all(|e| !e.path.starts_with("linkdir")));
    }

    #[cfg(unix)]
    #[test]
    fn test_records_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tree = sample_tree();
        let key = tree.path().join("keys").join("a");
        fs::set_permissions(&key, fs::Permissions::from_mode(0o600)).unwrap();

        let entries = collect_entries(tree.path(), &[]).unwrap();
        assert_eq!(entries[0].mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let tree = sample_tree();
        let key = tree.path().join("keys").join("a");
        fs::set_permissions(&key, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits
        if fs::read(&key).is_ok() {
            return;
        }

        let err = collect_entries(tree.path(), &[]).unwrap_err();
        match err {
            ProfilesError::Io { path, .. } => assert_eq!(path, key),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/base");
        assert_eq!(
            relative_path(root, Path::new("/base/keys/a")),
            Some(PathBuf::from("keys/a"))
        );
        assert_eq!(relative_path(root, Path::new("/base")), None);
        assert_eq!(relative_path(root, Path::new("/other/a")), None);
    }
}
