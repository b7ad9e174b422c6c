//! Path utilities shared by the sanitizer, the sandbox boundary and tree enumeration.
//!
//! Everything here is **lexical**: nothing touches the filesystem, so symlinks are never
//! resolved and filesystem case folding is never applied.
//!
//! Invariants of `normalize_path_lexical`:
//! - Removes `.` segments and repeated separators.
//! - Resolves `..` against preceding *normal* segments when possible.
//! - Preserves leading `..` for relative paths (e.g. `../../a/../b` → `../../b`).
//! - For absolute paths, `..` cannot climb above the filesystem root (`/../etc` → `/etc`).
//! - On Windows, preserves path prefixes (Disk/UNC/verbatim).
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;

pub(crate) fn normalize_path_lexical(path: &Path) -> PathBuf {
    #[derive(Debug)]
    enum Segment {
        ParentDir,
        Normal(OsString),
    }

    let mut path_prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut segments: Vec<Segment> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(segments.last(), Some(Segment::Normal(_))) {
                    segments.pop();
                } else if !has_root {
                    segments.push(Segment::ParentDir);
                }
            }
            Component::Normal(part) => segments.push(Segment::Normal(part.to_os_string())),
            Component::RootDir => {
                has_root = true;
            }
            Component::Prefix(prefix_comp) => {
                path_prefix = Some(prefix_comp.as_os_str().to_os_string());
            }
        }
    }

    let mut out = PathBuf::new();
    if let Some(prefix) = path_prefix {
        out.push(Path::new(&prefix));
    }
    if has_root {
        if out.as_os_str().is_empty() {
            #[cfg(windows)]
            out.push("\\");
            #[cfg(not(windows))]
            out.push("/");
        } else {
            // Pushing `RootDir` after `Prefix` would reset the path on Windows.
            #[cfg(windows)]
            {
                out.as_mut_os_string()
                    .push(std::path::MAIN_SEPARATOR.to_string());
            }
            #[cfg(not(windows))]
            {
                out.push("/");
            }
        }
    }
    for segment in segments {
        match segment {
            Segment::ParentDir => out.push(".."),
            Segment::Normal(part) => out.push(part),
        }
    }

    if out.as_os_str().is_empty() && path.is_relative() {
        PathBuf::from(".")
    } else {
        out
    }
}

#[inline]
fn normalized(path: &Path) -> Cow<'_, Path> {
    if path.as_os_str().is_empty() || normalize_path_lexical(path) == path {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(normalize_path_lexical(path))
    }
}

/// Returns `true` when `path` equals `base` or lies underneath it.
///
/// Both inputs are normalized lexically first. Comparison is component-wise, which is the
/// same as `path == base || path.starts_with(base + separator)` on the rendered strings:
/// `/sandbox-evil` is *not* inside `/sandbox`.
#[inline]
pub fn is_within(path: &Path, base: &Path) -> bool {
    let path = normalized(path);
    let base = normalized(base);
    path.as_ref().starts_with(base.as_ref())
}

/// Component-wise `strip_prefix` over lexically normalized inputs.
#[inline]
pub fn strip_prefix_normalized(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = normalized(path);
    let base = normalized(base);
    path.as_ref()
        .strip_prefix(base.as_ref())
        .ok()
        .map(PathBuf::from)
}

/// Drops any drive prefix and leading separators, turning an absolute path relative.
///
/// `/etc/passwd` → `etc/passwd`, `C:\Windows` → `Windows`, `/` → `.`.
pub(crate) fn strip_root_marker(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Returns `true` when a normalized relative path climbs above its starting directory.
#[inline]
pub(crate) fn escapes_start(normalized_relative: &Path) -> bool {
    matches!(
        normalized_relative.components().next(),
        Some(Component::ParentDir)
    )
}

#[inline]
pub(crate) fn to_posix_separators(raw: &str) -> Cow<'_, str> {
    if raw.contains('\\') {
        Cow::Owned(raw.replace('\\', "/"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Renders a relative path with `/` separators for glob matching.
pub(crate) fn relative_for_matching(relative: &Path) -> String {
    let mut out = String::new();
    for comp in relative.components() {
        if let Component::Normal(part) = comp {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}

pub(crate) fn normalize_glob_pattern_for_matching(pattern: &str) -> String {
    let normalized = to_posix_separators(pattern);
    let mut trimmed = normalized.as_ref();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn build_glob(pattern: &str) -> std::result::Result<globset::Glob, globset::Error> {
    let mut builder = GlobBuilder::new(pattern);
    builder.literal_separator(true);
    builder.build()
}
