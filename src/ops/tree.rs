//! Bounded directory-tree enumeration.
//!
//! The walk is depth-first in file-name order. A single [`TraversalBudget`] is shared by the
//! whole walk, so the entry limit is global rather than per directory. Once the budget is
//! spent the walk stops everywhere and the response is marked `truncated`.
//!
//! Only a failure to read the *root* aborts the call. An unreadable subdirectory is
//! reported on its own item (`error` set, `children` omitted) and the walk continues.
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::Context;

mod exclude;

use exclude::ExcludeMatcher;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
    /// Entry budget; defaults to `limits.default_tree_entries`, capped by
    /// `limits.max_tree_entries`. Zero is a valid budget.
    #[serde(default)]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryItem {
    pub name: String,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryItem {
    fn leaf(name: String, is_directory: bool) -> Self {
        Self {
            name,
            is_directory,
            children: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    /// Resolved absolute root of the walk.
    pub path: PathBuf,
    pub items: Vec<DirectoryItem>,
    /// Number of entries counted against the budget.
    pub count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TraversalBudget {
    count: usize,
    limit: usize,
    truncated: bool,
}

impl TraversalBudget {
    fn new(limit: usize) -> Self {
        Self {
            count: 0,
            limit,
            truncated: false,
        }
    }

    /// Marks truncation and returns `false` when no entry may be taken.
    fn admit(&mut self) -> bool {
        if self.truncated || self.count >= self.limit {
            self.truncated = true;
            return false;
        }
        true
    }

    fn consume(&mut self) {
        debug_assert!(self.count < self.limit);
        self.count += 1;
    }
}

pub fn list_tree(ctx: &Context, request: TreeRequest) -> Result<TreeResponse> {
    let root = ctx.resolve_path(&request.path)?;
    let limit = ctx.limits.tree_budget(request.max_entries);
    let excludes = ExcludeMatcher::compile(&request.exclude_patterns);

    let mut budget = TraversalBudget::new(limit);
    let items = walk_tree(&root, request.recursive, &excludes, &mut budget)?;
    tracing::debug!(
        root = %root.display(),
        count = budget.count,
        truncated = budget.truncated,
        "tree listed"
    );

    Ok(TreeResponse {
        path: root,
        items,
        count: budget.count,
        truncated: budget.truncated,
    })
}

/// An open directory on the walk stack. Index in the stack equals walk depth.
struct Frame {
    path: PathBuf,
    name: String,
    children: Vec<DirectoryItem>,
    error: Option<String>,
}

impl Frame {
    fn new(path: PathBuf, name: String) -> Self {
        Self {
            path,
            name,
            children: Vec::new(),
            error: None,
        }
    }

    fn into_item(self) -> DirectoryItem {
        let children = if self.error.is_some() {
            None
        } else {
            Some(sorted(self.children))
        };
        DirectoryItem {
            name: self.name,
            is_directory: true,
            children,
            error: self.error,
        }
    }
}

fn sorted(mut items: Vec<DirectoryItem>) -> Vec<DirectoryItem> {
    items.sort_by(compare_items);
    items
}

fn compare_items(a: &DirectoryItem, b: &DirectoryItem) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.cmp(&b.name))
}

/// Pops frames until the stack top is the parent of an entry at `depth`.
fn close_frames(stack: &mut Vec<Frame>, depth: usize) {
    while stack.len() > depth.max(1) {
        let Some(frame) = stack.pop() else {
            return;
        };
        let item = frame.into_item();
        if let Some(parent) = stack.last_mut() {
            parent.children.push(item);
        }
    }
}

fn root_error(root: &Path, err: walkdir::Error) -> Error {
    let op = "read_dir";
    match err.into_io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::NotFound => Error::NotFound(root.to_path_buf()),
        Some(io) => Error::io_path(op, root, io),
        None => Error::io_path(
            op,
            root,
            std::io::Error::other("directory walk failed at root"),
        ),
    }
}

fn walk_error_message(err: &walkdir::Error) -> String {
    match err.io_error() {
        Some(io) => io.to_string(),
        None => err.to_string(),
    }
}

/// Attaches a nested read failure to the open frame for `failed`.
///
/// Returns `false` when no open frame owns the path.
fn record_nested_error(stack: &mut [Frame], failed: Option<&Path>, message: String) -> bool {
    let Some(failed) = failed else {
        return false;
    };
    match stack.iter_mut().rev().find(|frame| frame.path == failed) {
        Some(frame) => {
            frame.error = Some(message);
            true
        }
        None => false,
    }
}

fn walk_tree(
    root: &Path,
    recursive: bool,
    excludes: &ExcludeMatcher,
    budget: &mut TraversalBudget,
) -> Result<Vec<DirectoryItem>> {
    let meta = super::io::metadata(root)?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter();
    let mut stack = vec![Frame::new(root.to_path_buf(), String::new())];

    while let Some(next) = walker.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 || err.path() == Some(root) {
                    return Err(root_error(root, err));
                }
                if !record_nested_error(&mut stack, err.path(), walk_error_message(&err)) {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                }
                continue;
            }
        };
        let depth = entry.depth();
        if depth == 0 {
            continue;
        }
        if !budget.admit() {
            break;
        }
        close_frames(&mut stack, depth);

        let is_directory = entry.file_type().is_dir();
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if excludes.is_match(&crate::path_utils::relative_for_matching(relative)) {
            if is_directory {
                walker.skip_current_dir();
            }
            continue;
        }
        budget.consume();

        let name = entry.file_name().to_string_lossy().into_owned();
        if is_directory && recursive {
            stack.push(Frame::new(entry.into_path(), name));
        } else if let Some(parent) = stack.last_mut() {
            parent.children.push(DirectoryItem::leaf(name, is_directory));
        }
    }

    close_frames(&mut stack, 1);
    Ok(stack
        .pop()
        .map(|root_frame| sorted(root_frame.children))
        .unwrap_or_default())
}

const INDENT: &str = "  ";

/// Renders a tree as indented text.
///
/// Directories are prefixed `[DIR]`, files `[FILE]`; a directory that could not be read gets
/// an `[ERROR]` line beneath it. A single truncation marker closes the output when the
/// budget ran out.
pub fn render_tree(response: &TreeResponse) -> String {
    let mut out = String::new();
    for item in &response.items {
        render_item(&mut out, item, 0);
    }
    if response.truncated {
        let _ = writeln!(
            out,
            "[TRUNCATED] listing stopped after {} entries",
            response.count
        );
    }
    out
}

fn render_item(out: &mut String, item: &DirectoryItem, level: usize) {
    let indent = INDENT.repeat(level);
    let tag = if item.is_directory { "[DIR]" } else { "[FILE]" };
    let _ = writeln!(out, "{indent}{tag} {}", item.name);
    if let Some(error) = &item.error {
        let _ = writeln!(out, "{indent}{INDENT}[ERROR] {error}");
    }
    for child in item.children.iter().flatten() {
        render_item(out, child, level + 1);
    }
}
