use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub create_parents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileResponse {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// `false` when an existing file was replaced.
    pub created: bool,
}

pub fn write_file(ctx: &Context, request: WriteFileRequest) -> Result<WriteFileResponse> {
    let bytes_written = request.content.len() as u64;
    if bytes_written > ctx.limits.max_write_bytes {
        return Err(Error::InputTooLarge {
            size_bytes: bytes_written,
            max_bytes: ctx.limits.max_write_bytes,
        });
    }

    let path = ctx.resolve_path(&request.path)?;
    super::io::ensure_parent_dir(&path, request.create_parents)?;
    let existed = super::io::check_destination(&path, request.overwrite)?;
    // Replacing a file keeps its permission bits.
    let permissions = if existed {
        super::io::metadata(&path).ok().map(|meta| meta.permissions())
    } else {
        None
    };

    super::io::commit_via_temp_file(&path, request.overwrite, permissions, |file| {
        file.write_all(request.content.as_bytes())
    })?;

    tracing::info!(path = %path.display(), bytes_written, replaced = existed, "file written");
    Ok(WriteFileResponse {
        path,
        bytes_written,
        created: !existed,
    })
}
