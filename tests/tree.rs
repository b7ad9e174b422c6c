mod common;

use common::{child, names, path_str, workspace, workspace_with_limits};
use fs_sandbox_tools::{ErrorCode, Limits, TreeRequest, list_tree, render_tree};

fn request(path: &str) -> TreeRequest {
    TreeRequest {
        path: path.to_string(),
        recursive: false,
        max_entries: None,
        exclude_patterns: Vec::new(),
    }
}

fn recursive(path: &str, exclude: &[&str]) -> TreeRequest {
    TreeRequest {
        recursive: true,
        exclude_patterns: exclude.iter().map(|p| p.to_string()).collect(),
        ..request(path)
    }
}

#[test]
fn directories_sort_before_files_then_by_name() {
    let ws = workspace();
    ws.write("b.txt", "b");
    ws.write("a.txt", "a");
    ws.mkdir("subdir");

    let resp = list_tree(&ws.ctx, request(".")).expect("list");
    assert_eq!(names(&resp.items), ["subdir", "a.txt", "b.txt"]);
    assert!(resp.items[0].is_directory);
    assert_eq!(resp.items[0].children, None, "non-recursive listing has no children");
    assert_eq!(resp.count, 3);
    assert!(!resp.truncated);
    assert_eq!(resp.path, ws.path());
}

#[test]
fn max_entries_truncates_deterministically() {
    let ws = workspace();
    for name in ["e.txt", "d.txt", "c.txt", "b.txt", "a.txt"] {
        ws.write(name, name);
    }

    let resp = list_tree(
        &ws.ctx,
        TreeRequest {
            max_entries: Some(2),
            ..request(".")
        },
    )
    .expect("list");
    assert_eq!(resp.count, 2);
    assert!(resp.truncated);
    assert_eq!(names(&resp.items), ["a.txt", "b.txt"]);

    let rendered = render_tree(&resp);
    assert_eq!(rendered.matches("[TRUNCATED]").count(), 1, "{rendered}");
    assert!(rendered.trim_end().ends_with("after 2 entries"), "{rendered}");
}

#[test]
fn budget_is_shared_across_levels() {
    let ws = workspace();
    ws.write("a/one.txt", "1");
    ws.write("a/two.txt", "2");
    ws.write("b/three.txt", "3");
    ws.write("top.txt", "t");

    let resp = list_tree(
        &ws.ctx,
        TreeRequest {
            max_entries: Some(4),
            ..recursive(".", &[])
        },
    )
    .expect("list");
    assert_eq!(resp.count, 4);
    assert!(resp.truncated);
    // a, a/one.txt, a/two.txt, b are counted before the budget runs out.
    assert_eq!(names(&resp.items), ["a", "b"]);
    let a = child(&resp.items, "a");
    assert_eq!(names(a.children.as_deref().expect("a children")), ["one.txt", "two.txt"]);
    let b = child(&resp.items, "b");
    assert_eq!(b.children.as_deref().map(<[_]>::len), Some(0));
}

#[test]
fn requested_budget_is_clamped_by_limits() {
    let ws = workspace_with_limits(Limits {
        default_tree_entries: Some(2),
        max_tree_entries: 3,
        ..Limits::default()
    });
    for name in ["1.txt", "2.txt", "3.txt", "4.txt", "5.txt"] {
        ws.write(name, name);
    }

    let resp = list_tree(&ws.ctx, request(".")).expect("default budget");
    assert_eq!(resp.count, 2);
    assert!(resp.truncated);

    let resp = list_tree(
        &ws.ctx,
        TreeRequest {
            max_entries: Some(100),
            ..request(".")
        },
    )
    .expect("clamped budget");
    assert_eq!(resp.count, 3);
    assert!(resp.truncated);
}

#[test]
fn exact_budget_is_not_truncated() {
    let ws = workspace();
    ws.write("a.txt", "a");
    ws.write("b.txt", "b");

    let resp = list_tree(
        &ws.ctx,
        TreeRequest {
            max_entries: Some(2),
            ..request(".")
        },
    )
    .expect("list");
    assert_eq!(resp.count, 2);
    assert!(!resp.truncated);
    assert!(!render_tree(&resp).contains("[TRUNCATED]"));
}

#[test]
fn zero_budget_lists_nothing_and_reports_truncation() {
    let ws = workspace();
    for name in ["a.txt", "b.txt", "c.txt"] {
        ws.write(name, name);
    }

    let resp = list_tree(
        &ws.ctx,
        TreeRequest {
            max_entries: Some(0),
            ..recursive(".", &[])
        },
    )
    .expect("list");
    assert_eq!(resp.count, 0);
    assert!(resp.truncated);
    assert!(resp.items.is_empty());
    assert_eq!(
        render_tree(&resp),
        "[TRUNCATED] listing stopped after 0 entries\n"
    );
}

#[test]
fn node_modules_is_excluded_at_every_depth() {
    let ws = workspace();
    ws.write("node_modules/pkg/index.js", "x");
    ws.write("nested/node_modules/pkg/index.js", "x");
    ws.write("nested/src/main.js", "x");
    ws.write("node_modules_backup/keep.js", "x");

    let resp = list_tree(&ws.ctx, recursive(".", &["node_modules"])).expect("list");
    assert_eq!(names(&resp.items), ["nested", "node_modules_backup"]);
    let nested = child(&resp.items, "nested");
    assert_eq!(names(nested.children.as_deref().expect("children")), ["src"]);
    // nested, nested/src, nested/src/main.js, node_modules_backup, node_modules_backup/keep.js
    assert_eq!(resp.count, 5);
    assert!(!resp.truncated);
}

#[test]
fn exclusion_is_exact_not_substring() {
    let ws = workspace();
    ws.write(".env", "SECRET=1");
    ws.write(".env.local", "LOCAL=1");
    ws.write("config/.env", "SECRET=2");

    let resp = list_tree(&ws.ctx, recursive(".", &[".env"])).expect("list");
    assert_eq!(names(&resp.items), ["config", ".env.local"]);
    let config = child(&resp.items, "config");
    assert_eq!(config.children.as_deref().map(<[_]>::len), Some(0));
}

#[test]
fn dot_git_exclusion_hides_repository_internals() {
    let ws = workspace();
    ws.write(".git/HEAD", "ref: refs/heads/main");
    ws.write(".git/objects/ab/cdef", "blob");
    ws.write(".gitignore", "target/");
    ws.write("src/lib.rs", "");

    let resp = list_tree(&ws.ctx, recursive(".", &[".git"])).expect("list");
    assert_eq!(names(&resp.items), ["src", ".gitignore"]);
    assert_eq!(resp.count, 3);
}

#[test]
fn excluded_entries_do_not_consume_budget() {
    let ws = workspace();
    ws.write("a.log", "x");
    ws.write("b.log", "x");
    ws.write("c.txt", "x");

    let resp = list_tree(
        &ws.ctx,
        TreeRequest {
            max_entries: Some(1),
            exclude_patterns: vec!["*.log".to_string()],
            ..request(".")
        },
    )
    .expect("list");
    assert_eq!(names(&resp.items), ["c.txt"]);
    assert_eq!(resp.count, 1);
    assert!(!resp.truncated);
}

#[test]
fn invalid_exclude_pattern_is_ignored() {
    let ws = workspace();
    ws.write("a.txt", "a");
    ws.write("target/out.bin", "x");

    let resp = list_tree(&ws.ctx, recursive(".", &["[", "target"])).expect("list");
    assert_eq!(names(&resp.items), ["a.txt"]);
}

#[test]
fn root_failures_are_classified() {
    let ws = workspace();
    ws.write("file.txt", "x");

    let err = list_tree(&ws.ctx, request("missing")).expect_err("missing root");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = list_tree(&ws.ctx, request("file.txt")).expect_err("file root");
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let outside = ws.path().parent().expect("tempdir has a parent");
    let err = list_tree(&ws.ctx, request(&path_str(outside))).expect_err("outside");
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let err = list_tree(&ws.ctx, request("../..")).expect_err("traversal");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[test]
fn response_serializes_without_empty_fields() {
    let ws = workspace();
    ws.write("dir/inner.txt", "x");

    let resp = list_tree(&ws.ctx, recursive(".", &[])).expect("list");
    let value = serde_json::to_value(&resp).expect("json");
    let dir = &value["items"][0];
    assert_eq!(dir["name"], "dir");
    assert_eq!(dir["is_directory"], true);
    assert!(dir.get("error").is_none());
    let inner = &dir["children"][0];
    assert_eq!(inner["name"], "inner.txt");
    assert!(inner.get("children").is_none());
    assert_eq!(value["count"], 2);
    assert_eq!(value["truncated"], false);
}

#[test]
#[cfg(unix)]
fn unreadable_subdirectory_is_reported_on_its_item() {
    use std::os::unix::fs::PermissionsExt;

    let ws = workspace();
    ws.write("locked/secret.txt", "x");
    ws.write("open/visible.txt", "x");
    let locked = ws.path().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).expect("chmod");

    // Privileged users can read the directory anyway; nothing to observe then.
    if std::fs::read_dir(&locked).is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        return;
    }

    let result = list_tree(&ws.ctx, recursive(".", &[]));
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    let resp = result.expect("nested failure does not fail the call");

    assert_eq!(names(&resp.items), ["locked", "open"]);
    let locked_item = child(&resp.items, "locked");
    assert!(locked_item.error.is_some());
    assert_eq!(locked_item.children, None);
    let open = child(&resp.items, "open");
    assert_eq!(names(open.children.as_deref().expect("children")), ["visible.txt"]);

    let rendered = render_tree(&resp);
    assert!(rendered.contains("[DIR] locked\n  [ERROR] "), "{rendered}");
}
