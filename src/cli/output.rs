//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ExecError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ExecError) -> String {
    match e {
        ExecError::FunctionParse { path, line, source } => {
            format!("{}:{}: {}", path.display(), line, source)
        }
        ExecError::FunctionDirNotFound(dir) => format!(
            "Functions directory not found: {} (use --functions to point elsewhere)",
            dir.display()
        ),
        ExecError::Command(err) => format!("Command error: {}", err),
        other => other.to_string(),
    }
}
