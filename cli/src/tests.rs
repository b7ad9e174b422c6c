use clap::CommandFactory;
use fs_sandbox_tools::{Context, Error, Limits, SandboxConfig};

use super::*;
use crate::error::tool_error_details;
use crate::input::load_text_limited;
use crate::serve::{Request, respond, serve_lines};

fn sandboxed_ctx(base: &std::path::Path) -> Context {
    let sandbox =
        SandboxConfig::try_from_base_dir(&base.to_string_lossy(), std::path::Path::new("/"))
            .expect("sandbox");
    Context::new(sandbox, Limits::default()).expect("ctx")
}

fn serve(ctx: &Context, input: &str) -> Vec<serde_json::Value> {
    let mut out = Vec::<u8>::new();
    serve_lines(ctx, input.as_bytes(), &mut out).expect("serve");
    String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[test]
fn clap_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn global_flags_and_tree_options_parse() {
    let cli = Cli::try_parse_from([
        "fs-sandbox-tools",
        "--base-dir",
        "/sandbox",
        "--error-format",
        "json",
        "--pretty",
        "tree",
        "src",
        "--recursive",
        "--max-entries",
        "5",
        "--exclude",
        "node_modules",
        "--exclude",
        ".git",
        "--text",
    ])
    .expect("parse");
    assert_eq!(cli.base_dir.as_deref(), Some("/sandbox"));
    assert!(cli.pretty);
    assert!(matches!(cli.error_format, ErrorFormat::Json));

    let request = command_exec::command_request(&cli.command, 1024).expect("request");
    match request {
        Request::RenderTree(tree) => {
            assert_eq!(tree.path, "src");
            assert!(tree.recursive);
            assert_eq!(tree.max_entries, Some(5));
            assert_eq!(tree.exclude_patterns, ["node_modules", ".git"]);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn write_rejects_both_content_sources() {
    let err = Cli::try_parse_from([
        "fs-sandbox-tools",
        "write",
        "out.txt",
        "--content",
        "x",
        "--content-file",
        "in.txt",
    ])
    .expect_err("conflict");
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn flags_override_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("server.toml");
    std::fs::write(&config, "base_dir = \"/from-file\"\n[limits]\nmax_read_bytes = 7\n")
        .expect("write");
    let config_arg = config.to_string_lossy().into_owned();

    let cli = Cli::try_parse_from([
        "fs-sandbox-tools",
        "--config",
        config_arg.as_str(),
        "--base-dir",
        "/from-flag",
        "resolve",
        "/from-flag/x",
    ])
    .expect("parse");
    let loaded = command_exec::load_server_config(&cli).expect("config");
    assert_eq!(loaded.base_dir.as_deref(), Some("/from-flag"));
    assert_eq!(loaded.limits.max_read_bytes, 7);
}

#[test]
fn load_text_limited_rejects_large_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("big.txt");
    std::fs::write(&path, "x".repeat(100)).expect("write");

    let err = load_text_limited(&path, 10).expect_err("should reject");
    match err {
        Error::InputTooLarge {
            size_bytes,
            max_bytes,
        } => {
            assert_eq!(size_bytes, 100);
            assert_eq!(max_bytes, 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(load_text_limited(&path, 100).expect("fits"), "x".repeat(100));
}

#[test]
#[cfg(unix)]
fn load_text_limited_refuses_symlinks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let real = dir.path().join("real.txt");
    std::fs::write(&real, "hello").expect("write");
    let link = dir.path().join("link.txt");
    std::os::unix::fs::symlink(&real, &link).expect("symlink");

    let err = load_text_limited(&link, 100).expect_err("symlink");
    assert!(matches!(err, Error::InvalidPath { .. }), "{err:?}");
}

#[test]
fn tool_error_details_covers_outside_sandbox() {
    let err = Error::OutsideSandbox {
        requested: "../../etc/passwd".to_string(),
        resolved: "/etc/passwd".into(),
        base: "/sandbox".into(),
    };
    let details = tool_error_details(&err).expect("details");
    assert_eq!(details["kind"], "outside_sandbox");
    assert_eq!(details["requested"], "../../etc/passwd");
    assert_eq!(details["base"], "/sandbox");

    let rendered = CliError::from(err).to_json();
    assert_eq!(rendered["code"], "FORBIDDEN");
    assert!(
        rendered["message"]
            .as_str()
            .is_some_and(|message| message.contains("outside the sandbox"))
    );
}

#[test]
fn tool_error_details_covers_invalid_path() {
    let err = Error::InvalidPath {
        input: "a\0b".to_string(),
        reason: "path contains a null byte".to_string(),
    };
    let details = tool_error_details(&err).expect("details");
    assert_eq!(details["kind"], "invalid_path");
    assert_eq!(details["reason"], "path contains a null byte");
    assert_eq!(CliError::from(err).code(), "VALIDATION_ERROR");
}

#[test]
fn serve_keeps_the_default_path_across_requests() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("notes.txt"), "hello").expect("write");
    let ctx = sandboxed_ctx(dir.path());

    let set = serde_json::json!({
        "op": "set_default_path",
        "path": dir.path().to_string_lossy(),
    });
    let input = format!(
        "{}\n\n{}\n{}\n",
        set,
        r#"{"op":"read_file","path":"notes.txt"}"#,
        r#"{"op":"get_default_path"}"#,
    );
    let responses = serve(&ctx, &input);
    assert_eq!(responses.len(), 3, "blank lines are skipped");

    assert_eq!(
        responses[0]["ok"]["default_path"],
        serde_json::json!(dir.path())
    );
    assert_eq!(responses[1]["ok"]["content"], "hello");
    assert_eq!(responses[2]["ok"]["default_path"], serde_json::json!(dir.path()));
}

#[test]
#[cfg(unix)]
fn serve_reports_errors_without_stopping() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = sandboxed_ctx(dir.path());

    let input = [
        r#"{"op":"resolve","path":"notes.txt"}"#,
        "not json",
        r#"{"op":"explode"}"#,
        r#"{"op":"resolve","path":"/etc/passwd"}"#,
        r#"{"op":"sanitize","input":"a/../b"}"#,
    ]
    .join("\n");
    let responses = serve(&ctx, &input);
    assert_eq!(responses.len(), 5);

    assert_eq!(responses[0]["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(responses[0]["error"]["details"]["kind"], "no_default_path");
    assert_eq!(responses[1]["error"]["code"], "JSON_ERROR");
    assert_eq!(responses[2]["error"]["code"], "JSON_ERROR");
    assert_eq!(responses[3]["error"]["code"], "FORBIDDEN");
    assert_eq!(responses[4]["ok"]["sanitized_path"], "b");
}

#[test]
fn render_tree_request_returns_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
    std::fs::write(dir.path().join("a.txt"), "a").expect("write");
    let ctx = sandboxed_ctx(dir.path());

    let line = serde_json::json!({
        "op": "render_tree",
        "path": dir.path().to_string_lossy(),
    })
    .to_string();
    let response = respond(&ctx, &line);
    assert_eq!(response["ok"]["text"], "[DIR] sub\n[FILE] a.txt\n");
    assert_eq!(response["ok"]["count"], 2);
    assert_eq!(response["ok"]["truncated"], false);
}

#[test]
fn serialize_json_honors_pretty_flag() {
    let value = serde_json::json!({ "a": 1 });
    assert_eq!(serialize_json(&value, false).expect("compact"), r#"{"a":1}"#);
    assert!(serialize_json(&value, true).expect("pretty").contains('\n'));
}
