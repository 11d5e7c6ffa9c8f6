//! Merge rules: defaults, override order, conflict handling.

use crate::execution::{ExecutionLimits, DEFAULT_MAX_QUEUE_SIZE};
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with the built-in limits applied as defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    let limits = ExecutionLimits::default();
    Config::builder()
        .set_default("execution.command_limit", limits.command_limit as u64)?
        .set_default("execution.fork_limit", limits.fork_limit as u64)?
        .set_default("execution.max_queue_size", DEFAULT_MAX_QUEUE_SIZE as u64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
