use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod command_exec;
mod error;
mod input;
mod serve;

#[cfg(test)]
mod tests;

use error::CliError;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "fs-sandbox-tools")]
#[command(
    about = "Resolve paths against a session default, confine them to a sandbox base, and run bounded filesystem operations."
)]
struct Cli {
    /// TOML or JSON server config. Environment and flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sandbox base directory (overrides `FS_SANDBOX_BASE_DIR`).
    #[arg(long)]
    base_dir: Option<String>,

    /// Initial session default path (overrides `FS_SANDBOX_DEFAULT_PATH`).
    #[arg(long)]
    default_path: Option<String>,

    #[arg(long, value_enum, default_value_t = ErrorFormat::Text)]
    error_format: ErrorFormat,

    /// Pretty-print JSON output.
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Log filter directive, e.g. `debug` or `fs_sandbox_tools=trace`. Defaults to `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize a path string without touching the filesystem.
    Sanitize {
        input: String,
        #[arg(long)]
        root_dir: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        posix: bool,
        #[arg(long, default_value_t = false)]
        allow_absolute: bool,
    },
    /// Resolve a path against the default path and the sandbox.
    Resolve { path: String },
    /// List a directory tree.
    Tree {
        #[arg(default_value = ".")]
        path: String,
        #[arg(long, default_value_t = false)]
        recursive: bool,
        #[arg(long)]
        max_entries: Option<usize>,
        /// Exclusion glob; may be repeated.
        #[arg(long = "exclude")]
        exclude_patterns: Vec<String>,
        /// Print an indented text tree instead of JSON.
        #[arg(long, default_value_t = false)]
        text: bool,
    },
    Read {
        path: String,
    },
    Write {
        path: String,
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read content from a file, or `-` for stdin.
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
        #[arg(long, default_value_t = false)]
        create_parents: bool,
    },
    Delete {
        path: String,
        #[arg(long, default_value_t = false)]
        recursive: bool,
        #[arg(long, default_value_t = false)]
        ignore_missing: bool,
    },
    Move {
        from: String,
        to: String,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    Copy {
        from: String,
        to: String,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Answer JSON requests from stdin, one per line, sharing one session.
    Serve,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };
    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let error_format = cli.error_format;
    if let Err(err) = command_exec::run(&cli) {
        match error_format {
            ErrorFormat::Text => eprintln!("{err}"),
            ErrorFormat::Json => {
                let out = serde_json::json!({ "error": err.to_json() });
                match serde_json::to_string(&out) {
                    Ok(text) => eprintln!("{text}"),
                    Err(_) => eprintln!("{err}"),
                }
            }
        }
        std::process::exit(1);
    }
}

pub(crate) fn serialize_json(value: &serde_json::Value, pretty: bool) -> Result<String, CliError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

pub(crate) fn write_stdout_line(line: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}
