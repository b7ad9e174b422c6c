use std::io::{BufRead, Write};

use fs_sandbox_tools::{
    Context, CopyFileRequest, DefaultPathResponse, DeleteRequest, MovePathRequest, ReadRequest,
    SanitizeOptions, TreeRequest, WriteFileRequest,
};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// One request, tagged by `op`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Request {
    Sanitize {
        input: String,
        #[serde(default)]
        options: SanitizeOptions,
    },
    Resolve {
        path: String,
    },
    SetDefaultPath {
        path: String,
    },
    GetDefaultPath,
    ClearDefaultPath,
    ListTree(TreeRequest),
    /// Same as `list_tree` but answers `{"text": ...}` with the rendered tree.
    RenderTree(TreeRequest),
    ReadFile(ReadRequest),
    WriteFile(WriteFileRequest),
    Delete(DeleteRequest),
    MovePath(MovePathRequest),
    CopyFile(CopyFileRequest),
}

impl Request {
    fn op(&self) -> &'static str {
        match self {
            Request::Sanitize { .. } => "sanitize",
            Request::Resolve { .. } => "resolve",
            Request::SetDefaultPath { .. } => "set_default_path",
            Request::GetDefaultPath => "get_default_path",
            Request::ClearDefaultPath => "clear_default_path",
            Request::ListTree(_) => "list_tree",
            Request::RenderTree(_) => "render_tree",
            Request::ReadFile(_) => "read_file",
            Request::WriteFile(_) => "write_file",
            Request::Delete(_) => "delete",
            Request::MovePath(_) => "move_path",
            Request::CopyFile(_) => "copy_file",
        }
    }
}

fn default_path_value(ctx: &Context) -> Result<serde_json::Value, CliError> {
    Ok(serde_json::to_value(DefaultPathResponse {
        default_path: ctx.default_path(),
    })?)
}

pub(crate) fn handle(ctx: &Context, request: Request) -> Result<serde_json::Value, CliError> {
    let value = match request {
        Request::Sanitize { input, options } => {
            serde_json::to_value(fs_sandbox_tools::sanitize_path(&input, &options)?)?
        }
        Request::Resolve { path } => {
            let resolved = ctx.resolve_path(&path)?;
            serde_json::json!({ "requested": path, "path": resolved })
        }
        Request::SetDefaultPath { path } => {
            ctx.set_default_path(&path)?;
            default_path_value(ctx)?
        }
        Request::GetDefaultPath => default_path_value(ctx)?,
        Request::ClearDefaultPath => {
            ctx.clear_default_path();
            default_path_value(ctx)?
        }
        Request::ListTree(request) => serde_json::to_value(ctx.list_tree(request)?)?,
        Request::RenderTree(request) => {
            let response = ctx.list_tree(request)?;
            serde_json::json!({
                "path": response.path,
                "count": response.count,
                "truncated": response.truncated,
                "text": fs_sandbox_tools::render_tree(&response),
            })
        }
        Request::ReadFile(request) => serde_json::to_value(ctx.read_file(request)?)?,
        Request::WriteFile(request) => serde_json::to_value(ctx.write_file(request)?)?,
        Request::Delete(request) => serde_json::to_value(ctx.delete(request)?)?,
        Request::MovePath(request) => serde_json::to_value(ctx.move_path(request)?)?,
        Request::CopyFile(request) => serde_json::to_value(ctx.copy_file(request)?)?,
    };
    Ok(value)
}

/// Answers one line. Never fails: errors become `{"error": ...}` responses.
pub(crate) fn respond(ctx: &Context, line: &str) -> serde_json::Value {
    let result = serde_json::from_str::<Request>(line)
        .map_err(CliError::from)
        .and_then(|request| {
            let op = request.op();
            tracing::debug!(op, "handling request");
            handle(ctx, request).inspect_err(|err| {
                tracing::debug!(op, code = err.code(), error = %err, "request failed");
            })
        });
    match result {
        Ok(value) => serde_json::json!({ "ok": value }),
        Err(err) => serde_json::json!({ "error": err.to_json() }),
    }
}

/// Reads requests until EOF, writing one compact JSON response per non-blank line.
pub(crate) fn serve_lines<R: BufRead, W: Write>(
    ctx: &Context,
    input: R,
    mut output: W,
) -> Result<usize, CliError> {
    let mut handled = 0usize;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = respond(ctx, &line);
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
        handled += 1;
    }
    tracing::info!(handled, "input closed; serve loop finished");
    Ok(handled)
}
