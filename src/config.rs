use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sandbox::{BASE_DIR_ENV, SandboxConfig};

/// Environment variable holding the initial session default path.
pub const DEFAULT_PATH_ENV: &str = "FS_SANDBOX_DEFAULT_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,
    #[serde(default = "default_max_write_bytes")]
    pub max_write_bytes: u64,
    /// Entry budget for `list_tree` when the request does not name one.
    ///
    /// Unset means 500, lowered to `max_tree_entries` when that is smaller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tree_entries: Option<usize>,
    /// Upper bound applied to any requested `list_tree` budget.
    #[serde(default = "default_max_tree_entries")]
    pub max_tree_entries: usize,
}

const fn default_max_read_bytes() -> u64 {
    1024 * 1024
}

const fn default_max_write_bytes() -> u64 {
    1024 * 1024
}

const DEFAULT_TREE_ENTRIES: usize = 500;

const fn default_max_tree_entries() -> usize {
    10_000
}

const MAX_READ_BYTES_HARD_CAP: u64 = 256 * 1024 * 1024;
const MAX_WRITE_BYTES_HARD_CAP: u64 = 256 * 1024 * 1024;
const MAX_TREE_ENTRIES_HARD_CAP: usize = 1_000_000;

fn validate_u64_limit(value: u64, field: &str, hard_cap: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidConfig(format!("{field} must be > 0")));
    }
    if value > hard_cap {
        return Err(Error::InvalidConfig(format!(
            "{field} must be <= {hard_cap}"
        )));
    }
    Ok(())
}

fn validate_usize_limit(value: usize, field: &str, hard_cap: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidConfig(format!("{field} must be > 0")));
    }
    if value > hard_cap {
        return Err(Error::InvalidConfig(format!(
            "{field} must be <= {hard_cap}"
        )));
    }
    Ok(())
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_read_bytes: default_max_read_bytes(),
            max_write_bytes: default_max_write_bytes(),
            default_tree_entries: None,
            max_tree_entries: default_max_tree_entries(),
        }
    }
}

impl Limits {
    pub fn validate(&self) -> Result<()> {
        validate_u64_limit(
            self.max_read_bytes,
            "limits.max_read_bytes",
            MAX_READ_BYTES_HARD_CAP,
        )?;
        validate_u64_limit(
            self.max_write_bytes,
            "limits.max_write_bytes",
            MAX_WRITE_BYTES_HARD_CAP,
        )?;
        validate_usize_limit(
            self.max_tree_entries,
            "limits.max_tree_entries",
            MAX_TREE_ENTRIES_HARD_CAP,
        )?;
        if let Some(default_tree_entries) = self.default_tree_entries {
            validate_usize_limit(
                default_tree_entries,
                "limits.default_tree_entries",
                MAX_TREE_ENTRIES_HARD_CAP,
            )?;
            if default_tree_entries > self.max_tree_entries {
                return Err(Error::InvalidConfig(
                    "limits.default_tree_entries must be <= limits.max_tree_entries".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Budget used when a `list_tree` request does not name one.
    pub fn effective_default_tree_entries(&self) -> usize {
        self.default_tree_entries
            .unwrap_or(DEFAULT_TREE_ENTRIES)
            .min(self.max_tree_entries)
    }

    /// Effective entry budget for one `list_tree` call.
    ///
    /// A request for zero entries is honored and lists nothing.
    pub fn tree_budget(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or_else(|| self.effective_default_tree_entries())
            .min(self.max_tree_entries)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Sandbox base directory; absolute, or relative to the process working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,
    /// Session default path installed at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
    #[serde(default)]
    pub limits: Limits,
}

impl ServerConfig {
    /// Structural validation only; it does not touch the filesystem.
    ///
    /// An unusable `base_dir` is not an error here: it disables the sandbox when the
    /// [`SandboxConfig`] is built.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if let Some(default_path) = self.default_path.as_deref()
            && !std::path::Path::new(default_path).is_absolute()
        {
            return Err(Error::InvalidConfig(format!(
                "default_path must be absolute: {default_path:?}"
            )));
        }
        Ok(())
    }

    /// Overrides file values with `FS_SANDBOX_BASE_DIR` / `FS_SANDBOX_DEFAULT_PATH` when set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(BASE_DIR_ENV).ok(),
            std::env::var(DEFAULT_PATH_ENV).ok(),
        );
    }

    pub(crate) fn apply_overrides(&mut self, base_dir: Option<String>, default_path: Option<String>) {
        if let Some(base_dir) = base_dir.filter(|value| !value.trim().is_empty()) {
            self.base_dir = Some(base_dir);
        }
        if let Some(default_path) = default_path.filter(|value| !value.trim().is_empty()) {
            self.default_path = Some(default_path);
        }
    }

    pub fn sandbox(&self) -> SandboxConfig {
        SandboxConfig::from_optional(self.base_dir.as_deref())
    }
}
