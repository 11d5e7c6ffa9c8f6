//! Error types for the command execution engine.

use std::path::PathBuf;
use thiserror::Error;

/// User-facing command errors.
///
/// These are the only failures a command or modifier may raise. They are
/// reported through the source and its result callback and never escape
/// [`ExecutionContext::run_command_queue`](crate::execution::ExecutionContext::run_command_queue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandSyntaxError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Maximum number of contexts ({0}) reached")]
    ForkLimitReached(usize),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Insufficient permission (requires level {0})")]
    Permission(u8),

    #[error("{0}")]
    Failed(String),
}

/// Errors outside of command execution: configuration, IO, function loading.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse {path}:{line}: {source}")]
    FunctionParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: CommandSyntaxError,
    },

    #[error("Function directory not found: {0}")]
    FunctionDirNotFound(PathBuf),

    #[error("Command error: {0}")]
    Command(#[from] CommandSyntaxError),
}

impl From<config::ConfigError> for ExecError {
    fn from(err: config::ConfigError) -> Self {
        ExecError::ConfigError(err.to_string())
    }
}
