use std::io::Read;
use std::path::Path;

use fs_sandbox_tools::Error;

pub(crate) const HARD_MAX_TEXT_INPUT_BYTES: u64 = 64 * 1024 * 1024;

/// Reads UTF-8 text from a file, or from stdin when `path` is `-`.
///
/// Symlinked input paths are refused. Inputs over `max_bytes` fail with
/// [`Error::InputTooLarge`] instead of being truncated.
pub(crate) fn load_text_limited(path: &Path, max_bytes: u64) -> Result<String, Error> {
    if max_bytes == 0 {
        return Err(Error::InvalidConfig(
            "max input bytes must be > 0".to_string(),
        ));
    }
    if max_bytes > HARD_MAX_TEXT_INPUT_BYTES {
        return Err(Error::InvalidConfig(format!(
            "max input bytes exceeds hard limit ({HARD_MAX_TEXT_INPUT_BYTES} bytes)"
        )));
    }

    let limit = max_bytes.saturating_add(1);
    let mut bytes = Vec::<u8>::new();

    if path.as_os_str() == "-" {
        std::io::stdin()
            .take(limit)
            .read_to_end(&mut bytes)
            .map_err(|err| Error::IoPath {
                op: "read_stdin",
                path: path.to_path_buf(),
                source: err,
            })?;
    } else {
        let meta = std::fs::symlink_metadata(path).map_err(|err| Error::IoPath {
            op: "symlink_metadata",
            path: path.to_path_buf(),
            source: err,
        })?;
        if meta.file_type().is_symlink() {
            return Err(Error::InvalidPath {
                input: path.display().to_string(),
                reason: "refusing to read text input from a symlink".to_string(),
            });
        }
        if !meta.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        if meta.len() > max_bytes {
            return Err(Error::InputTooLarge {
                size_bytes: meta.len(),
                max_bytes,
            });
        }

        std::fs::File::open(path)
            .and_then(|file| file.take(limit).read_to_end(&mut bytes))
            .map_err(|err| Error::IoPath {
                op: "read",
                path: path.to_path_buf(),
                source: err,
            })?;
    }

    if bytes.len() as u64 > max_bytes {
        return Err(Error::InputTooLarge {
            size_bytes: bytes.len() as u64,
            max_bytes,
        });
    }

    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))
}
