use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResponse {
    pub path: PathBuf,
    /// Number of bytes read from disk.
    pub bytes_read: u64,
    pub content: String,
}

/// Reads a whole UTF-8 file. Fails instead of truncating when the file exceeds
/// `limits.max_read_bytes`.
pub fn read_file(ctx: &Context, request: ReadRequest) -> Result<ReadResponse> {
    let path = ctx.resolve_path(&request.path)?;
    let bytes = super::io::read_bytes_limited(&path, ctx.limits.max_read_bytes)?;
    let bytes_read = bytes.len() as u64;
    let content = String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.clone()))?;

    tracing::debug!(path = %path.display(), bytes_read, "file read");
    Ok(ReadResponse {
        path,
        bytes_read,
        content,
    })
}
