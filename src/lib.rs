//! `fs-sandbox-tools` resolves caller-supplied paths against a session default directory and
//! confines them to an optional sandbox base, then runs bounded filesystem operations on them.
//!
//! All checks are lexical and in-process: paths are normalized without touching the
//! filesystem, and the sandbox test is a component-wise prefix comparison. Symlinks below the
//! sandbox base are not resolved.

pub mod config;
#[cfg(feature = "config-io")]
pub mod config_io;
mod error;
pub mod ops;
pub mod path_utils;
pub mod sandbox;
pub mod sanitize;

pub use config::{DEFAULT_PATH_ENV, Limits, ServerConfig};
#[cfg(feature = "config-io")]
pub use config_io::{ConfigFormat, load_config, load_config_limited, parse_config};
pub use error::{Error, ErrorCode, Result};
pub use ops::{
    Context, CopyFileRequest, CopyFileResponse, DefaultPathResponse, DeleteKind, DeleteRequest,
    DeleteResponse, DirectoryItem, MovePathRequest, MovePathResponse, ReadRequest, ReadResponse,
    TreeRequest, TreeResponse, WriteFileRequest, WriteFileResponse, copy_file, delete,
    list_tree, move_path, read_file, render_tree, write_file,
};
pub use sandbox::{BASE_DIR_ENV, SandboxConfig};
pub use sanitize::{SanitizeOptions, SanitizedPathInfo, sanitize_path};
