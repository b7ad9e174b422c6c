use std::path::{Path, PathBuf};

use crate::config::{Limits, ServerConfig};
use crate::error::{Error, Result};
use crate::sandbox::SandboxConfig;

use super::{
    Context, CopyFileRequest, CopyFileResponse, DeleteRequest, DeleteResponse, MovePathRequest,
    MovePathResponse, ReadRequest, ReadResponse, TreeRequest, TreeResponse, WriteFileRequest,
    WriteFileResponse,
};

impl Context {
    pub fn new(sandbox: SandboxConfig, limits: Limits) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            sandbox,
            limits,
            session: super::session::SessionDefaultPath::default(),
        })
    }

    /// Builds a context from a validated [`ServerConfig`].
    ///
    /// An unusable `base_dir` disables the sandbox (with a warning); an invalid
    /// `default_path` is an error.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        config.validate()?;
        let ctx = Self::new(config.sandbox(), config.limits)?;
        if let Some(default_path) = config.default_path.as_deref() {
            ctx.set_default_path(default_path)?;
        }
        Ok(ctx)
    }

    /// Loads a config file, applies environment overrides, and builds the context.
    #[cfg(feature = "config-io")]
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = crate::config_io::load_config(path)?;
        config.apply_env();
        Self::from_config(&config)
    }

    pub fn sandbox(&self) -> &SandboxConfig {
        &self.sandbox
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn sandbox_base(&self) -> Option<&Path> {
        self.sandbox.base_dir()
    }

    pub fn default_path(&self) -> Option<PathBuf> {
        self.session.get()
    }

    pub fn clear_default_path(&self) {
        if let Some(previous) = self.session.clear() {
            tracing::info!(previous = %previous.display(), "default path cleared");
        }
    }

    /// Refuses destructive operations on the sandbox base or a filesystem root.
    pub(super) fn ensure_not_protected(&self, path: &Path, op: &str) -> Result<()> {
        if path.parent().is_none() {
            return Err(Error::NotPermitted(format!(
                "refusing to {op} the filesystem root {}",
                path.display()
            )));
        }
        if self.sandbox_base() == Some(path) {
            return Err(Error::NotPermitted(format!(
                "refusing to {op} the sandbox base {}",
                path.display()
            )));
        }
        Ok(())
    }

    pub fn list_tree(&self, request: TreeRequest) -> Result<TreeResponse> {
        super::list_tree(self, request)
    }

    pub fn read_file(&self, request: ReadRequest) -> Result<ReadResponse> {
        super::read_file(self, request)
    }

    pub fn write_file(&self, request: WriteFileRequest) -> Result<WriteFileResponse> {
        super::write_file(self, request)
    }

    pub fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse> {
        super::delete(self, request)
    }

    pub fn move_path(&self, request: MovePathRequest) -> Result<MovePathResponse> {
        super::move_path(self, request)
    }

    pub fn copy_file(&self, request: CopyFileRequest) -> Result<CopyFileResponse> {
        super::copy_file(self, request)
    }
}
