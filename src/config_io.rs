//! Reading [`ServerConfig`] files.
//!
//! A config file is small and flat:
//!
//! ```toml
//! base_dir = "/srv/sandbox"
//! default_path = "/srv/sandbox/work"
//!
//! [limits]
//! max_read_bytes = 1048576
//! max_tree_entries = 2000
//! ```
//!
//! The same shape is accepted as JSON. Every field is optional and unknown fields are
//! rejected. Loading only reads the file: `FS_SANDBOX_BASE_DIR` and
//! `FS_SANDBOX_DEFAULT_PATH` are layered on afterwards by [`ServerConfig::apply_env`], and
//! command-line flags go on top of that.
use std::io::Read;
use std::path::Path;

use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Config files hold a handful of scalars; anything larger is almost certainly the wrong file.
const DEFAULT_MAX_CONFIG_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` is JSON; `.toml` or no extension is TOML; anything else is refused.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") | None => Ok(Self::Toml),
            Some(other) => Err(Error::InvalidConfig(format!(
                "config file {} has unsupported extension {other:?}; use .toml or .json",
                path.display()
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Parses config text without validating limits or paths.
pub fn parse_config(raw: &str, format: ConfigFormat) -> Result<ServerConfig> {
    let parsed = match format {
        ConfigFormat::Json => serde_json::from_str(raw).map_err(|err| err.to_string()),
        ConfigFormat::Toml => toml::from_str(raw).map_err(|err| err.to_string()),
    };
    parsed.map_err(|message| {
        Error::InvalidConfig(format!("malformed {} server config: {message}", format.as_str()))
    })
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ServerConfig> {
    load_config_limited(path, DEFAULT_MAX_CONFIG_BYTES)
}

/// Reads, parses and validates a config file of at most `max_bytes`.
///
/// The path must name a regular file; a symlink is refused rather than followed.
pub fn load_config_limited(path: impl AsRef<Path>, max_bytes: u64) -> Result<ServerConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let raw = read_config_text(path, max_bytes)?;

    let config = parse_config(&raw, format)?;
    config.validate().map_err(|err| match err {
        Error::InvalidConfig(message) => {
            Error::InvalidConfig(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;
    tracing::debug!(path = %path.display(), format = format.as_str(), "server config loaded");
    Ok(config)
}

fn read_config_text(path: &Path, max_bytes: u64) -> Result<String> {
    if max_bytes == 0 {
        return Err(Error::InvalidConfig(
            "config byte limit must be > 0".to_string(),
        ));
    }

    let meta =
        std::fs::symlink_metadata(path).map_err(|err| Error::io_path("metadata", path, err))?;
    if meta.file_type().is_symlink() {
        return Err(Error::InvalidConfig(format!(
            "config file {} is a symlink; point at the real file instead",
            path.display()
        )));
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

    let mut bytes = Vec::<u8>::new();
    std::fs::File::open(path)
        .map_err(|err| Error::io_path("open", path, err))?
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| Error::io_path("read", path, err))?;
    // The file may have grown after `symlink_metadata`.
    if bytes.len() as u64 > max_bytes {
        return Err(Error::InputTooLarge {
            size_bytes: bytes.len() as u64,
            max_bytes,
        });
    }

    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))
}
