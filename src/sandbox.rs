//! The process-level sandbox boundary.
//!
//! A [`SandboxConfig`] is built once at startup and never changes afterwards. When it carries
//! a base directory, every path handed out by [`crate::Context::resolve_path`] is the base
//! itself or lies beneath it.
//!
//! The check is lexical: it compares normalized paths component by component. Symlinks are
//! not resolved and filesystem case folding is not applied, so a symlink inside the base
//! that points elsewhere, or a differently-cased alias on a case-insensitive filesystem,
//! is not caught here.
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path_utils::{is_within, normalize_path_lexical};
use crate::sanitize::{SanitizeOptions, sanitize_path};

/// Environment variable holding the sandbox base directory.
pub const BASE_DIR_ENV: &str = "FS_SANDBOX_BASE_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxConfig {
    base_dir: Option<PathBuf>,
}

impl SandboxConfig {
    /// A configuration with no boundary: every sanitized absolute path is accepted.
    pub fn disabled() -> Self {
        Self { base_dir: None }
    }

    /// Builds a boundary from a raw base-directory string.
    ///
    /// Relative values are resolved against `process_root`. The result is sanitized and
    /// normalized; any failure is returned to the caller.
    pub fn try_from_base_dir(raw: &str, process_root: &Path) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidConfig(
                "sandbox base directory is empty".to_string(),
            ));
        }

        let candidate = if Path::new(trimmed).is_absolute() {
            PathBuf::from(trimmed)
        } else {
            if !process_root.is_absolute() {
                return Err(Error::InvalidConfig(format!(
                    "cannot resolve relative sandbox base {trimmed:?}: process root {} is not absolute",
                    process_root.display()
                )));
            }
            process_root.join(trimmed)
        };
        let candidate = candidate.to_str().ok_or_else(|| {
            Error::InvalidConfig(format!(
                "sandbox base directory {} is not valid utf-8",
                candidate.display()
            ))
        })?;

        let info = sanitize_path(candidate, &SanitizeOptions::allow_absolute()).map_err(|err| {
            Error::InvalidConfig(format!("invalid sandbox base directory: {err}"))
        })?;
        Ok(Self {
            base_dir: Some(PathBuf::from(info.sanitized_path)),
        })
    }

    /// Like [`SandboxConfig::try_from_base_dir`], but an invalid value disables the boundary
    /// with a warning instead of failing startup.
    pub fn from_base_dir(raw: &str, process_root: &Path) -> Self {
        match Self::try_from_base_dir(raw, process_root) {
            Ok(config) => {
                if let Some(base) = config.base_dir() {
                    tracing::info!(base = %base.display(), "sandbox boundary enabled");
                }
                config
            }
            Err(err) => {
                tracing::warn!(
                    raw,
                    error = %err,
                    "invalid sandbox base directory; sandboxing disabled"
                );
                Self::disabled()
            }
        }
    }

    /// Reads [`BASE_DIR_ENV`] once. Unset or blank means no boundary.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(BASE_DIR_ENV))
    }

    fn from_env_value(value: std::result::Result<String, std::env::VarError>) -> Self {
        match value {
            Ok(raw) if !raw.trim().is_empty() => Self::from_optional(Some(&raw)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Self::disabled(),
            Err(std::env::VarError::NotUnicode(raw)) => {
                tracing::warn!(
                    raw = %raw.to_string_lossy(),
                    "{BASE_DIR_ENV} is not valid utf-8; sandboxing disabled"
                );
                Self::disabled()
            }
        }
    }

    /// Resolves an optional configured value against the current directory.
    pub fn from_optional(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::disabled();
        };
        match std::env::current_dir() {
            Ok(cwd) => Self::from_base_dir(raw, &cwd),
            Err(err) if Path::new(raw.trim()).is_absolute() => {
                tracing::debug!(error = %err, "current directory unavailable");
                Self::from_base_dir(raw, Path::new(""))
            }
            Err(err) => {
                tracing::warn!(
                    raw,
                    error = %err,
                    "cannot resolve relative sandbox base without a current directory; sandboxing disabled"
                );
                Self::disabled()
            }
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.base_dir.is_some()
    }

    /// Verifies that `resolved` stays inside the boundary.
    ///
    /// `requested` is the caller's original input; it is only used for error context.
    pub fn check(&self, requested: &str, resolved: &Path) -> Result<()> {
        let Some(base) = self.base_dir.as_deref() else {
            return Ok(());
        };
        if is_within(resolved, base) {
            return Ok(());
        }
        tracing::warn!(
            requested,
            resolved = %resolved.display(),
            base = %base.display(),
            "path outside sandbox rejected"
        );
        Err(Error::OutsideSandbox {
            requested: requested.to_string(),
            resolved: resolved.to_path_buf(),
            base: normalize_path_lexical(base),
        })
    }
}
