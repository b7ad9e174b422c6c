use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub ignore_missing: bool,
}

/// What was found at a path before it was removed or moved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteKind {
    File,
    Dir,
    Symlink,
    Other,
    Missing,
}

impl DeleteKind {
    pub(super) fn of(meta: &fs::Metadata) -> Self {
        let file_type = meta.file_type();
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Dir
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
            Self::Symlink => "symlink",
            Self::Other => "other",
            Self::Missing => "missing",
        }
    }
}

impl std::fmt::Display for DeleteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub path: PathBuf,
    pub deleted: bool,
    #[serde(rename = "type")]
    pub kind: DeleteKind,
}

fn missing_response(path: PathBuf) -> DeleteResponse {
    DeleteResponse {
        path,
        deleted: false,
        kind: DeleteKind::Missing,
    }
}

fn unlink_symlink(target: &Path) -> std::io::Result<()> {
    #[cfg(windows)]
    {
        match fs::remove_file(target) {
            Ok(()) => Ok(()),
            // Directory symlinks and junctions need remove_dir on Windows.
            Err(remove_file_err) => fs::remove_dir(target).map_err(|_| remove_file_err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::remove_file(target)
    }
}

/// Removes a file, symlink, or (with `recursive`) a directory tree.
///
/// Symlinks are unlinked, never followed. The sandbox base and filesystem roots are refused.
pub fn delete(ctx: &Context, request: DeleteRequest) -> Result<DeleteResponse> {
    let path = ctx.resolve_path(&request.path)?;
    ctx.ensure_not_protected(&path, "delete")?;

    let Some(meta) = super::io::try_symlink_metadata(&path)? else {
        if request.ignore_missing {
            return Ok(missing_response(path));
        }
        return Err(Error::NotFound(path));
    };
    let kind = DeleteKind::of(&meta);

    let (op, removed) = match kind {
        DeleteKind::Dir => {
            if !request.recursive {
                return Err(Error::invalid_path(
                    request.path,
                    "path is a directory; set recursive=true to delete directories",
                ));
            }
            ("remove_dir_all", fs::remove_dir_all(&path))
        }
        DeleteKind::Symlink => ("unlink_symlink", unlink_symlink(&path)),
        _ => ("remove_file", fs::remove_file(&path)),
    };
    match removed {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && request.ignore_missing => {
            return Ok(missing_response(path));
        }
        Err(err) => return Err(Error::io_path(op, &path, err)),
    }

    tracing::info!(path = %path.display(), kind = %kind, "path deleted");
    Ok(DeleteResponse {
        path,
        deleted: true,
        kind,
    })
}
