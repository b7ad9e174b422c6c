use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sanitize::{SanitizeOptions, sanitize_path};

use super::Context;

// Resolution is lexical. The returned path has no `.`/`..` segments and, with an active
// sandbox, is component-wise under the base, but symlinks beneath the base are not resolved.
// Callers that need protection against symlink indirection must canonicalize and re-check.
impl Context {
    /// Turns a caller-supplied path into a validated absolute path.
    ///
    /// Relative inputs are joined onto the session default path; without one they are
    /// rejected. The result is sanitized and then checked against the sandbox boundary.
    pub fn resolve_path(&self, requested: &str) -> Result<PathBuf> {
        if requested.is_empty() {
            return Err(Error::invalid_path(requested, "path must not be empty"));
        }

        let candidate = if Path::new(requested).is_absolute() {
            requested.to_string()
        } else {
            let Some(default_path) = self.session.get() else {
                return Err(Error::NoDefaultPath {
                    requested: requested.to_string(),
                });
            };
            default_path.join(requested).to_string_lossy().into_owned()
        };

        let info = sanitize_path(&candidate, &SanitizeOptions::allow_absolute())
            .map_err(|err| with_requested_context(err, requested, &candidate))?;
        let resolved = PathBuf::from(info.sanitized_path);
        if !resolved.is_absolute() {
            return Err(Error::invalid_path(
                requested,
                format!("resolved path {} is not absolute", resolved.display()),
            ));
        }

        self.sandbox.check(requested, &resolved)?;
        tracing::debug!(requested, resolved = %resolved.display(), "path resolved");
        Ok(resolved)
    }

    /// Replaces the session default path.
    ///
    /// There is no merge with the previous value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPath`] (`VALIDATION_ERROR`) when `path` is relative, contains a NUL
    ///   byte, or fails sanitization.
    /// - [`Error::OutsideSandbox`] (`FORBIDDEN`) when a sandbox is configured and `path` lies
    ///   outside it. The previous default is kept in that case.
    pub fn set_default_path(&self, path: &str) -> Result<()> {
        if path.contains('\0') {
            return Err(Error::invalid_path(path, "path contains a null byte"));
        }
        if !Path::new(path).is_absolute() {
            return Err(Error::invalid_path(path, "default path must be absolute"));
        }
        let info = sanitize_path(path, &SanitizeOptions::allow_absolute())?;
        let default_path = PathBuf::from(info.sanitized_path);
        self.sandbox.check(path, &default_path)?;

        let previous = self.session.replace(default_path.clone());
        tracing::info!(
            default_path = %default_path.display(),
            previous = ?previous,
            "default path set"
        );
        Ok(())
    }
}

fn with_requested_context(err: Error, requested: &str, candidate: &str) -> Error {
    match err {
        Error::InvalidPath { reason, .. } if requested != candidate => Error::InvalidPath {
            input: requested.to_string(),
            reason: format!("{reason} (resolved candidate {candidate:?})"),
        },
        other => other,
    }
}
