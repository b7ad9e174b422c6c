use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::sandbox::SandboxConfig;

mod context;
mod copy_file;
mod delete;
mod io;
mod move_path;
mod read;
mod resolve;
mod session;
mod tree;
mod write;

pub use copy_file::{CopyFileRequest, CopyFileResponse, copy_file};
pub use delete::{DeleteKind, DeleteRequest, DeleteResponse, delete};
pub use move_path::{MovePathRequest, MovePathResponse, move_path};
pub use read::{ReadRequest, ReadResponse, read_file};
pub use tree::{DirectoryItem, TreeRequest, TreeResponse, list_tree, render_tree};
pub use write::{WriteFileRequest, WriteFileResponse, write_file};


/// Everything an operation needs to turn caller paths into validated absolute paths.
///
/// The sandbox boundary and limits are fixed at construction. The session default path is
/// the only mutable part; it is shared by every caller holding this `Context`. Build a
/// separate `Context` per caller when callers must not see each other's default.
pub struct Context {
    sandbox: SandboxConfig,
    limits: Limits,
    session: session::SessionDefaultPath,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("sandbox", &self.sandbox.base_dir())
            .field("default_path", &self.session.get())
            .field("limits", &self.limits)
            .finish()
    }
}

/// Response for `set_default_path` / `get_default_path` style calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPathResponse {
    pub default_path: Option<std::path::PathBuf>,
}
