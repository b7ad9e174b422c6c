use fs_sandbox_tools::{
    Context, CopyFileRequest, DeleteRequest, MovePathRequest, ReadRequest, SanitizeOptions,
    ServerConfig, TreeRequest, WriteFileRequest,
};

use crate::error::CliError;
use crate::input::load_text_limited;
use crate::serve::Request;
use crate::{Cli, Command};

/// Config file first, then `FS_SANDBOX_*` environment variables, then command-line flags.
pub(crate) fn load_server_config(cli: &Cli) -> Result<ServerConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => fs_sandbox_tools::load_config(path)?,
        None => ServerConfig::default(),
    };
    config.apply_env();
    if let Some(base_dir) = &cli.base_dir {
        config.base_dir = Some(base_dir.clone());
    }
    if let Some(default_path) = &cli.default_path {
        config.default_path = Some(default_path.clone());
    }
    Ok(config)
}

pub(crate) fn run(cli: &Cli) -> Result<(), CliError> {
    let config = load_server_config(cli)?;
    let ctx = Context::from_config(&config)?;
    tracing::debug!(?ctx, "context ready");

    if let Command::Serve = cli.command {
        let stdin = std::io::stdin().lock();
        let stdout = std::io::stdout().lock();
        crate::serve::serve_lines(&ctx, stdin, stdout)?;
        return Ok(());
    }

    let request = command_request(&cli.command, ctx.limits().max_write_bytes)?;
    let text_output = matches!(cli.command, Command::Tree { text: true, .. });
    let value = crate::serve::handle(&ctx, request)?;

    if text_output {
        let text = value
            .get("text")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        return crate::write_stdout_line(text.trim_end_matches('\n'));
    }
    let out = crate::serialize_json(&value, cli.pretty)?;
    crate::write_stdout_line(&out)
}

/// Maps a one-shot subcommand onto the request type `serve` accepts.
pub(crate) fn command_request(command: &Command, max_write_bytes: u64) -> Result<Request, CliError> {
    let request = match command {
        Command::Sanitize {
            input,
            root_dir,
            posix,
            allow_absolute,
        } => Request::Sanitize {
            input: input.clone(),
            options: SanitizeOptions {
                root_dir: root_dir.clone(),
                to_posix_separators: *posix,
                allow_absolute_outside_root: *allow_absolute,
            },
        },
        Command::Resolve { path } => Request::Resolve { path: path.clone() },
        Command::Tree {
            path,
            recursive,
            max_entries,
            exclude_patterns,
            text,
        } => {
            let tree = TreeRequest {
                path: path.clone(),
                recursive: *recursive,
                max_entries: *max_entries,
                exclude_patterns: exclude_patterns.clone(),
            };
            if *text {
                Request::RenderTree(tree)
            } else {
                Request::ListTree(tree)
            }
        }
        Command::Read { path } => Request::ReadFile(ReadRequest { path: path.clone() }),
        Command::Write {
            path,
            content,
            content_file,
            overwrite,
            create_parents,
        } => {
            let content = match (content, content_file) {
                (Some(content), _) => content.clone(),
                (None, Some(file)) => load_text_limited(
                    file,
                    max_write_bytes.min(crate::input::HARD_MAX_TEXT_INPUT_BYTES),
                )?,
                (None, None) => String::new(),
            };
            Request::WriteFile(WriteFileRequest {
                path: path.clone(),
                content,
                overwrite: *overwrite,
                create_parents: *create_parents,
            })
        }
        Command::Delete {
            path,
            recursive,
            ignore_missing,
        } => Request::Delete(DeleteRequest {
            path: path.clone(),
            recursive: *recursive,
            ignore_missing: *ignore_missing,
        }),
        Command::Move {
            from,
            to,
            overwrite,
        } => Request::MovePath(MovePathRequest {
            from: from.clone(),
            to: to.clone(),
            overwrite: *overwrite,
        }),
        Command::Copy {
            from,
            to,
            overwrite,
        } => Request::CopyFile(CopyFileRequest {
            from: from.clone(),
            to: to.clone(),
            overwrite: *overwrite,
        }),
        Command::Serve => {
            return Err(CliError::Tool(fs_sandbox_tools::Error::InvalidConfig(
                "serve is not a one-shot command".to_string(),
            )));
        }
    };
    Ok(request)
}
