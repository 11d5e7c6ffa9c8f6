//! Configuration System
//!
//! Layered configuration for scheduler limits and logging. Sources, lowest
//! precedence first: built-in defaults, the global config file, workspace
//! config files, then `CMDEXEC__*` environment variables. Command line flags
//! are applied on top by the CLI.

use crate::error::ExecError;
use crate::execution::{ExecutionLimits, DEFAULT_MAX_QUEUE_SIZE};
use crate::logging::LoggingConfig;
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

/// Environment file picked when `CMDEXEC_ENV` is unset.
const DEFAULT_ENVIRONMENT: &str = "development";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CmdexecConfig {
    /// Scheduler limits
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Limits applied to every execution context created by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Commands a single run may execute before stopping
    #[serde(default = "default_command_limit")]
    pub command_limit: usize,

    /// Maximum sources a single redirect may produce
    #[serde(default = "default_fork_limit")]
    pub fork_limit: usize,

    /// Pending entries allowed before the run is aborted
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

fn default_command_limit() -> usize {
    ExecutionLimits::default().command_limit
}

fn default_fork_limit() -> usize {
    ExecutionLimits::default().fork_limit
}

fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command_limit: default_command_limit(),
            fork_limit: default_fork_limit(),
            max_queue_size: default_max_queue_size(),
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.command_limit == 0 {
            return Err("execution.command_limit must be greater than zero".to_string());
        }
        if self.fork_limit == 0 {
            return Err("execution.fork_limit must be greater than zero".to_string());
        }
        if self.max_queue_size == 0 {
            return Err("execution.max_queue_size must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn to_limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            command_limit: self.command_limit,
            fork_limit: self.fork_limit,
            max_queue_size: self.max_queue_size,
        }
    }
}

impl CmdexecConfig {
    pub fn validate(&self) -> Result<(), ExecError> {
        self.execution.validate().map_err(ExecError::ConfigError)?;
        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ExecError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Builds a [`CmdexecConfig`] from every configured source.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<CmdexecConfig, ExecError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = Self::workspace_files(workspace_root)
            .into_iter()
            .fold(builder, |builder, path| {
                debug!(config_path = %path.display(), "Using workspace configuration");
                builder.add_source(File::from(path).required(true))
            });
        let builder = builder.add_source(
            Environment::with_prefix("CMDEXEC")
                .separator("__")
                .try_parsing(true),
        );
        let config: CmdexecConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file on top of the defaults, ignoring every other source.
    pub fn load_from_file(path: &Path) -> Result<CmdexecConfig, ExecError> {
        let config: CmdexecConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Workspace files that exist, lowest precedence first:
    /// `config/config.toml`, then `config/{CMDEXEC_ENV}.toml`.
    pub fn workspace_files(workspace_root: &Path) -> Vec<PathBuf> {
        let config_dir = workspace_root.join("config");
        let environment =
            std::env::var("CMDEXEC_ENV").unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());
        [
            config_dir.join("config.toml"),
            config_dir.join(format!("{}.toml", environment)),
        ]
        .into_iter()
        .filter(|path| path.is_file())
        .collect()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    pub fn default() -> CmdexecConfig {
        CmdexecConfig::default()
    }
}
