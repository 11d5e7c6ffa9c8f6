//! CLI parse: clap types for cmdexec. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cmdexec - run command functions on a bounded, depth-first scheduler
#[derive(Parser)]
#[command(name = "cmdexec")]
#[command(about = "Run command functions with quota, fork and queue limits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum commands per run (overrides execution.command_limit)
    #[arg(long)]
    pub command_limit: Option<usize>,

    /// Maximum sources per redirect (overrides execution.fork_limit)
    #[arg(long)]
    pub fork_limit: Option<usize>,

    /// Maximum pending entries (overrides execution.max_queue_size)
    #[arg(long)]
    pub max_queue_size: Option<usize>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Options shared by the commands that execute something.
#[derive(clap::Args, Debug, Clone)]
pub struct ExecOptions {
    /// Directory of .mcfunction files (default: <workspace>/functions)
    #[arg(long)]
    pub functions: Option<PathBuf>,

    /// Namespace for loaded function ids
    #[arg(long, default_value = "main")]
    pub namespace: String,

    /// Log every command, return and call at debug level
    #[arg(long)]
    pub trace: bool,

    /// Write trace events as JSON lines to this file
    #[arg(long)]
    pub trace_file: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call a function and run it to completion
    Run {
        /// Function id, e.g. main:setup
        function: String,

        #[command(flatten)]
        options: ExecOptions,
    },
    /// Parse and run a single command line
    Exec {
        /// Command line, e.g. "execute as a,b run say hi"
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,

        #[command(flatten)]
        options: ExecOptions,
    },
    /// List the functions found in the functions directory
    Functions {
        /// Directory of .mcfunction files (default: <workspace>/functions)
        #[arg(long)]
        functions: Option<PathBuf>,

        /// Namespace for loaded function ids
        #[arg(long, default_value = "main")]
        namespace: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
