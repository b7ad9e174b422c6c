#![allow(dead_code)]

use std::path::Path;

use fs_sandbox_tools::{Context, DirectoryItem, Limits, SandboxConfig};

/// A temp directory that is both the sandbox base and the session default path.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub ctx: Context,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parents");
        }
        std::fs::write(path, content).expect("write fixture");
    }

    pub fn mkdir(&self, relative: &str) {
        std::fs::create_dir_all(self.dir.path().join(relative)).expect("mkdir fixture");
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(relative)).expect("read fixture")
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn sandbox_for(base: &Path) -> SandboxConfig {
    SandboxConfig::try_from_base_dir(&path_str(base), Path::new("/")).expect("sandbox")
}

pub fn workspace_with_limits(limits: Limits) -> Workspace {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = Context::new(sandbox_for(dir.path()), limits).expect("ctx");
    ctx.set_default_path(&path_str(dir.path()))
        .expect("set default path");
    Workspace { dir, ctx }
}

pub fn workspace() -> Workspace {
    workspace_with_limits(Limits::default())
}

pub fn names(items: &[DirectoryItem]) -> Vec<&str> {
    items.iter().map(|item| item.name.as_str()).collect()
}

pub fn child<'a>(items: &'a [DirectoryItem], name: &str) -> &'a DirectoryItem {
    items
        .iter()
        .find(|item| item.name == name)
        .unwrap_or_else(|| panic!("missing item {name:?} in {:?}", names(items)))
}
