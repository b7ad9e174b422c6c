use std::fs;
use std::io::Read;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileResponse {
    pub from: PathBuf,
    pub to: PathBuf,
    pub bytes: u64,
    /// `false` when an existing file was replaced.
    pub created: bool,
}

/// Copies one regular file. Sources larger than `limits.max_write_bytes` are refused.
pub fn copy_file(ctx: &Context, request: CopyFileRequest) -> Result<CopyFileResponse> {
    let source = ctx.resolve_path(&request.from)?;
    let destination = ctx.resolve_path(&request.to)?;
    if source == destination {
        return Err(Error::invalid_path(
            request.to,
            "source and destination are the same path",
        ));
    }

    let source_meta = super::io::metadata(&source)?;
    if !source_meta.is_file() {
        return Err(Error::NotAFile(source));
    }
    let max_bytes = ctx.limits.max_write_bytes;
    if source_meta.len() > max_bytes {
        return Err(Error::FileTooLarge {
            path: source,
            size_bytes: source_meta.len(),
            max_bytes,
        });
    }

    super::io::ensure_parent_dir(&destination, false)?;
    let existed = super::io::check_destination(&destination, request.overwrite)?;

    let input = fs::File::open(&source).map_err(|err| Error::io_path("open", &source, err))?;
    let mut bytes = 0u64;
    super::io::commit_via_temp_file(
        &destination,
        request.overwrite,
        Some(source_meta.permissions()),
        |file| {
            bytes = std::io::copy(&mut input.take(max_bytes.saturating_add(1)), file)?;
            if bytes > max_bytes {
                return Err(std::io::Error::other(format!(
                    "source grew past {max_bytes} bytes during copy"
                )));
            }
            Ok(())
        },
    )?;

    tracing::info!(
        from = %source.display(),
        to = %destination.display(),
        bytes,
        "file copied"
    );
    Ok(CopyFileResponse {
        from: source,
        to: destination,
        bytes,
        created: !existed,
    })
}
