use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Context, DeleteKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovePathRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovePathResponse {
    pub from: PathBuf,
    pub to: PathBuf,
    pub moved: bool,
    #[serde(rename = "type")]
    pub kind: DeleteKind,
}

/// Renames a file or directory. Both endpoints must resolve inside the sandbox.
///
/// An existing destination is replaced only when it is not a directory and `overwrite` is
/// set. The destination's parent directory must already exist.
pub fn move_path(ctx: &Context, request: MovePathRequest) -> Result<MovePathResponse> {
    let source = ctx.resolve_path(&request.from)?;
    let destination = ctx.resolve_path(&request.to)?;
    if source == destination {
        return Err(Error::invalid_path(
            request.to,
            "source and destination are the same path",
        ));
    }
    ctx.ensure_not_protected(&source, "move")?;
    ctx.ensure_not_protected(&destination, "replace")?;
    if destination.starts_with(&source) {
        return Err(Error::invalid_path(
            request.to,
            format!("cannot move {} into itself", source.display()),
        ));
    }

    let kind = DeleteKind::of(&super::io::symlink_metadata(&source)?);
    super::io::ensure_parent_dir(&destination, false)?;
    if super::io::check_destination(&destination, request.overwrite)? {
        fs::remove_file(&destination)
            .map_err(|err| Error::io_path("remove_file", &destination, err))?;
    }
    fs::rename(&source, &destination)
        .map_err(|err| Error::io_path("rename", &destination, err))?;

    tracing::info!(
        from = %source.display(),
        to = %destination.display(),
        kind = %kind,
        "path moved"
    );
    Ok(MovePathResponse {
        from: source,
        to: destination,
        moved: true,
        kind,
    })
}
