use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

fn not_found_or_io(op: &'static str, path: &Path, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::NotFound(path.to_path_buf())
    } else {
        Error::io_path(op, path, err)
    }
}

/// `fs::metadata` with a missing path reported as [`Error::NotFound`].
pub(super) fn metadata(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|err| not_found_or_io("metadata", path, err))
}

/// Like [`metadata`] but does not follow a final symlink.
pub(super) fn symlink_metadata(path: &Path) -> Result<fs::Metadata> {
    fs::symlink_metadata(path).map_err(|err| not_found_or_io("symlink_metadata", path, err))
}

/// `None` when nothing exists at `path`; other I/O failures are errors.
pub(super) fn try_symlink_metadata(path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io_path("symlink_metadata", path, err)),
    }
}

/// Reads at most `max_bytes` from a regular file.
pub(super) fn read_bytes_limited(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let meta = metadata(path)?;
    if !meta.is_file() {
        return Err(Error::NotAFile(path.to_path_buf()));
    }
    if meta.len() > max_bytes {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            max_bytes,
        });
    }

    let limit = max_bytes.saturating_add(1);
    let mut bytes = Vec::<u8>::new();
    fs::File::open(path)
        .map_err(|err| not_found_or_io("open", path, err))?
        .take(limit)
        .read_to_end(&mut bytes)
        .map_err(|err| Error::io_path("read", path, err))?;

    // The file may have grown between `metadata` and `read`.
    if bytes.len() as u64 > max_bytes {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size_bytes: bytes.len() as u64,
            max_bytes,
        });
    }
    Ok(bytes)
}

/// Fails unless `destination` is absent or may be replaced.
///
/// Returns whether something already existed there. Directories are never replaced.
pub(super) fn check_destination(destination: &Path, overwrite: bool) -> Result<bool> {
    let Some(meta) = try_symlink_metadata(destination)? else {
        return Ok(false);
    };
    if meta.is_dir() {
        return Err(Error::NotAFile(destination.to_path_buf()));
    }
    if !overwrite {
        return Err(Error::AlreadyExists(destination.to_path_buf()));
    }
    Ok(true)
}

/// Stages bytes in a temp file next to `destination` and renames it into place.
///
/// Without `overwrite` the final rename refuses to replace an existing entry, so a racing
/// writer surfaces as [`Error::AlreadyExists`] rather than being clobbered.
pub(super) fn commit_via_temp_file(
    destination: &Path,
    overwrite: bool,
    permissions: Option<fs::Permissions>,
    fill: impl FnOnce(&mut fs::File) -> std::io::Result<()>,
) -> Result<()> {
    let parent = destination
        .parent()
        .ok_or_else(|| Error::NotAFile(destination.to_path_buf()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".fs-sandbox-tools.")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|err| Error::io_path("create_temp", parent, err))?;
    fill(tmp.as_file_mut()).map_err(|err| Error::io_path("write", destination, err))?;
    if let Some(perms) = permissions {
        tmp.as_file()
            .set_permissions(perms)
            .map_err(|err| Error::io_path("set_permissions", destination, err))?;
    }
    tmp.as_file_mut()
        .sync_all()
        .map_err(|err| Error::io_path("sync", destination, err))?;

    let persisted = if overwrite {
        tmp.persist(destination)
    } else {
        tmp.persist_noclobber(destination)
    };
    persisted.map(drop).map_err(|err| {
        if err.error.kind() == std::io::ErrorKind::AlreadyExists && !overwrite {
            Error::AlreadyExists(destination.to_path_buf())
        } else {
            Error::io_path("rename", destination, err.error)
        }
    })
}

/// Requires the parent of `path` to be an existing directory, creating it when allowed.
pub(super) fn ensure_parent_dir(path: &Path, create: bool) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Err(Error::NotAFile(path.to_path_buf()));
    };
    match metadata(parent) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(parent.to_path_buf())),
        Err(Error::NotFound(_)) if create => {
            fs::create_dir_all(parent).map_err(|err| Error::io_path("create_dir_all", parent, err))?;
            tracing::debug!(parent = %parent.display(), "created parent directories");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bytes_limited_rejects_large_files_and_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.txt");
        fs::write(&path, b"0123456789").expect("write");

        assert_eq!(read_bytes_limited(&path, 10).expect("read"), b"0123456789");
        match read_bytes_limited(&path, 9).expect_err("too large") {
            Error::FileTooLarge {
                size_bytes,
                max_bytes,
                ..
            } => {
                assert_eq!(size_bytes, 10);
                assert_eq!(max_bytes, 9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            read_bytes_limited(dir.path(), 10).expect_err("dir"),
            Error::NotAFile(_)
        ));
        assert!(matches!(
            read_bytes_limited(&dir.path().join("missing"), 10).expect_err("missing"),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn commit_via_temp_file_respects_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");

        commit_via_temp_file(&path, false, None, |file| {
            std::io::Write::write_all(file, b"first")
        })
        .expect("create");
        assert_eq!(fs::read_to_string(&path).expect("read"), "first");

        let err = commit_via_temp_file(&path, false, None, |file| {
            std::io::Write::write_all(file, b"second")
        })
        .expect_err("exists");
        assert!(matches!(err, Error::AlreadyExists(_)), "{err:?}");

        commit_via_temp_file(&path, true, None, |file| {
            std::io::Write::write_all(file, b"second")
        })
        .expect("overwrite");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");

        let leftovers = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn ensure_parent_dir_creates_only_when_asked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b").join("file.txt");

        assert!(matches!(
            ensure_parent_dir(&nested, false).expect_err("missing parent"),
            Error::NotFound(_)
        ));
        ensure_parent_dir(&nested, true).expect("create parents");
        assert!(dir.path().join("a").join("b").is_dir());

        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").expect("write");
        assert!(matches!(
            ensure_parent_dir(&file.join("child.txt"), true).expect_err("file parent"),
            Error::NotADirectory(_)
        ));
    }
}
