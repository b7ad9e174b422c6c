//! Lexical path sanitization.
//!
//! [`sanitize_path`] turns a caller-supplied path string into a normalized path, optionally
//! confined beneath a root directory. It never touches the filesystem.
//!
//! Calling it on its own output with the same [`SanitizeOptions`] returns the same
//! `sanitized_path`.
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path_utils::{
    escapes_start, is_within, normalize_path_lexical, strip_prefix_normalized, strip_root_marker,
    to_posix_separators,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SanitizeOptions {
    /// Absolute directory the result must stay under. The result is then root-relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,
    /// Convert `\` to `/` in the input and the result.
    #[serde(default)]
    pub to_posix_separators: bool,
    /// Keep absolute inputs as-is when no `root_dir` is given.
    ///
    /// When `false`, an absolute input without a `root_dir` has its root marker stripped and
    /// is returned as a relative path with `converted_to_relative` set.
    #[serde(default)]
    pub allow_absolute_outside_root: bool,
}

impl SanitizeOptions {
    pub fn within_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root_dir.into()),
            ..Self::default()
        }
    }

    pub fn allow_absolute() -> Self {
        Self {
            allow_absolute_outside_root: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedPathInfo {
    pub sanitized_path: String,
    pub original_input: String,
    /// Whether the input was absolute *before* normalization.
    pub was_absolute: bool,
    /// Set when an absolute input was rewritten into a relative one.
    pub converted_to_relative: bool,
    pub options_used: SanitizeOptions,
}

impl SanitizedPathInfo {
    pub fn as_path(&self) -> &Path {
        Path::new(&self.sanitized_path)
    }
}

pub fn sanitize_path(input: &str, options: &SanitizeOptions) -> Result<SanitizedPathInfo> {
    if input.is_empty() {
        return Err(Error::invalid_path(input, "path must not be empty"));
    }
    if input.contains('\0') {
        return Err(Error::invalid_path(input, "path contains a null byte"));
    }

    let was_absolute = Path::new(input).is_absolute();
    let prepared = if options.to_posix_separators {
        to_posix_separators(input)
    } else {
        Cow::Borrowed(input)
    };
    let normalized = normalize_path_lexical(Path::new(prepared.as_ref()));

    let mut converted_to_relative = false;
    let sanitized = match options.root_dir.as_deref() {
        Some(root_dir) => confine_to_root(input, &normalized, root_dir, options)?,
        None if normalized.is_absolute() => {
            if options.allow_absolute_outside_root {
                normalized
            } else {
                // Absolute inputs are rewritten rather than rejected. Callers that need a hard
                // boundary must pass `root_dir` or check `converted_to_relative`.
                let relative = strip_root_marker(&normalized);
                tracing::warn!(
                    input,
                    sanitized = %relative.display(),
                    "absolute path rewritten as relative; absolute paths outside a root are not allowed"
                );
                converted_to_relative = true;
                relative
            }
        }
        None => {
            if escapes_start(&normalized) {
                return Err(Error::invalid_path(
                    input,
                    "path traversal detected: path escapes the current directory",
                ));
            }
            normalized
        }
    };

    Ok(SanitizedPathInfo {
        sanitized_path: render(&sanitized, options.to_posix_separators),
        original_input: input.to_string(),
        was_absolute,
        converted_to_relative,
        options_used: options.clone(),
    })
}

fn confine_to_root(
    input: &str,
    normalized: &Path,
    root_dir: &Path,
    options: &SanitizeOptions,
) -> Result<PathBuf> {
    if !root_dir.is_absolute() {
        return Err(Error::invalid_path(
            input,
            format!("root directory {} must be absolute", root_dir.display()),
        ));
    }
    let root = normalize_path_lexical(root_dir);
    let resolved = normalize_path_lexical(&root.join(normalized));
    if !is_within(&resolved, &root) {
        return Err(Error::invalid_path(
            input,
            format!(
                "path traversal detected: resolves outside root {}",
                root.display()
            ),
        ));
    }

    let relative = strip_prefix_normalized(&resolved, &root).ok_or_else(|| {
        Error::invalid_path(
            input,
            format!(
                "failed to derive a path relative to root {}",
                root.display()
            ),
        )
    })?;
    let relative = if relative.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        relative
    };
    if relative.is_absolute() && !options.allow_absolute_outside_root {
        return Err(Error::invalid_path(
            input,
            format!(
                "path is absolute relative to root {} and absolute paths are not allowed",
                root.display()
            ),
        ));
    }
    Ok(relative)
}

fn render(path: &Path, posix: bool) -> String {
    let rendered = path.to_string_lossy();
    if posix {
        to_posix_separators(&rendered).into_owned()
    } else {
        rendered.into_owned()
    }
}
