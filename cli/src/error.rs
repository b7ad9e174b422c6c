use fs_sandbox_tools::Error;

const CLI_ERROR_CODE_JSON: &str = "JSON_ERROR";
const CLI_ERROR_CODE_IO: &str = "IO_ERROR";

#[derive(Debug)]
pub(crate) enum CliError {
    Tool(Error),
    Json(serde_json::Error),
    /// Failure writing to stdout or reading stdin in the CLI itself.
    Io(std::io::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Tool(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "json error: {err}"),
            CliError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Tool(err) => Some(err),
            CliError::Json(err) => Some(err),
            CliError::Io(err) => Some(err),
        }
    }
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        Self::Tool(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl CliError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            CliError::Tool(err) => err.code().as_str(),
            CliError::Json(_) => CLI_ERROR_CODE_JSON,
            CliError::Io(_) => CLI_ERROR_CODE_IO,
        }
    }

    /// `{"code", "message", "details"?}`; the value placed under `"error"`.
    pub(crate) fn to_json(&self) -> serde_json::Value {
        let mut error = serde_json::Map::new();
        error.insert(
            "code".to_string(),
            serde_json::Value::String(self.code().to_string()),
        );
        error.insert(
            "message".to_string(),
            serde_json::Value::String(self.to_string()),
        );
        if let CliError::Tool(tool) = self
            && let Some(details) = tool_error_details(tool)
        {
            error.insert("details".to_string(), details);
        }
        serde_json::Value::Object(error)
    }
}

pub(crate) fn tool_error_details(tool: &Error) -> Option<serde_json::Value> {
    match tool {
        Error::IoPath { op, path, .. } => Some(serde_json::json!({
            "kind": "io_path",
            "op": op,
            "path": path.display().to_string(),
        })),
        Error::InvalidConfig(message) => Some(serde_json::json!({
            "kind": "invalid_config",
            "message": message,
        })),
        Error::InvalidPath { input, reason } => Some(serde_json::json!({
            "kind": "invalid_path",
            "input": input,
            "reason": reason,
        })),
        Error::NoDefaultPath { requested } => Some(serde_json::json!({
            "kind": "no_default_path",
            "requested": requested,
        })),
        Error::OutsideSandbox {
            requested,
            resolved,
            base,
        } => Some(serde_json::json!({
            "kind": "outside_sandbox",
            "requested": requested,
            "resolved": resolved.display().to_string(),
            "base": base.display().to_string(),
        })),
        Error::NotFound(path) => Some(serde_json::json!({
            "kind": "not_found",
            "path": path.display().to_string(),
        })),
        Error::NotADirectory(path) => Some(serde_json::json!({
            "kind": "not_a_directory",
            "path": path.display().to_string(),
        })),
        Error::NotAFile(path) => Some(serde_json::json!({
            "kind": "not_a_file",
            "path": path.display().to_string(),
        })),
        Error::AlreadyExists(path) => Some(serde_json::json!({
            "kind": "already_exists",
            "path": path.display().to_string(),
        })),
        Error::FileTooLarge {
            path,
            size_bytes,
            max_bytes,
        } => Some(serde_json::json!({
            "kind": "file_too_large",
            "path": path.display().to_string(),
            "size_bytes": size_bytes,
            "max_bytes": max_bytes,
        })),
        Error::InputTooLarge {
            size_bytes,
            max_bytes,
        } => Some(serde_json::json!({
            "kind": "input_too_large",
            "size_bytes": size_bytes,
            "max_bytes": max_bytes,
        })),
        Error::InvalidUtf8(path) => Some(serde_json::json!({
            "kind": "invalid_utf8",
            "path": path.display().to_string(),
        })),
        Error::NotPermitted(message) => Some(serde_json::json!({
            "kind": "not_permitted",
            "message": message,
        })),
        _ => None,
    }
}
