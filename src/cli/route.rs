//! CLI route: single route table and run context. Builds the scheduler for
//! each command and hands results to presentation.

use crate::builtins::ScriptSource;
use crate::cli::parse::{Cli, Commands, ExecOptions};
use crate::cli::presentation::{
    format_function_list_text, format_run_summary_json, format_run_summary_text, outcome_label,
    RunSummary,
};
use crate::config::{CmdexecConfig, ConfigLoader};
use crate::error::{CommandSyntaxError, ExecError};
use crate::execution::{ExecutionContext, JsonTraceCallbacks, LogTraceCallbacks};
use crate::profiler::TracingProfiler;
use crate::source::{CommandResultCallback, ExecutionCommandSource};
use chrono::Utc;
use std::cell::Cell;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};

const CONSOLE_SOURCE: &str = "console";

/// Runtime context for CLI execution: workspace root and effective config.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CmdexecConfig,
}

impl RunContext {
    /// Load config for the CLI's workspace and apply limit flags on top.
    pub fn new(cli: &Cli) -> Result<Self, ExecError> {
        let mut config = match cli.config {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&cli.workspace)?,
        };
        if let Some(limit) = cli.command_limit {
            config.execution.command_limit = limit;
        }
        if let Some(limit) = cli.fork_limit {
            config.execution.fork_limit = limit;
        }
        if let Some(limit) = cli.max_queue_size {
            config.execution.max_queue_size = limit;
        }
        config.validate()?;
        Ok(Self {
            workspace_root: cli.workspace.clone(),
            config,
        })
    }

    pub fn from_config(workspace_root: PathBuf, config: CmdexecConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &CmdexecConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ExecError> {
        match command {
            Commands::Run { function, options } => self.run_function(function, options),
            Commands::Exec { command, options } => self.exec_command(&command.join(" "), options),
            Commands::Functions {
                functions,
                namespace,
            } => self.list_functions(functions.as_deref(), namespace),
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ExecError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn functions_dir(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.workspace_root.join(dir),
            None => self.workspace_root.join("functions"),
        }
    }

    /// Console source with functions loaded. A missing default directory is
    /// fine; a missing explicit one is an error.
    fn console_source(&self, options: &ExecOptions) -> Result<ScriptSource, ExecError> {
        let source = ScriptSource::new(CONSOLE_SOURCE);
        let dir = self.functions_dir(options.functions.as_deref());
        if options.functions.is_some() || dir.is_dir() {
            source.load_functions(&dir, &options.namespace)?;
        }
        Ok(source)
    }

    fn new_context(&self, options: &ExecOptions) -> Result<ExecutionContext<ScriptSource>, ExecError> {
        let mut context = ExecutionContext::with_limits(
            self.config.execution.to_limits(),
            Box::new(TracingProfiler::new()),
        );
        if let Some(ref path) = options.trace_file {
            let writer = BufWriter::new(File::create(path)?);
            context.set_tracer(Box::new(JsonTraceCallbacks::new(writer)));
        } else if options.trace {
            context.set_tracer(Box::new(LogTraceCallbacks));
        }
        Ok(context)
    }

    fn run_function(&self, id: &str, options: &ExecOptions) -> Result<String, ExecError> {
        let source = self.console_source(options)?;
        let function = source
            .function(id)
            .ok_or_else(|| CommandSyntaxError::UnknownFunction(id.to_string()))?;
        let mut context = self.new_context(options)?;
        let (callback, result) = result_recorder();

        info!(function = id, "Running function");
        context.queue_initial_function_call(function, source.clone(), callback);
        Ok(self.finish(id, context, &source, &result, options))
    }

    fn exec_command(&self, input: &str, options: &ExecOptions) -> Result<String, ExecError> {
        let source = self.console_source(options)?;
        let (callback, result) = result_recorder();
        let source = source.with_callback(callback.clone());
        let chain = source.dispatcher().parse(input, &source)?;
        let mut context = self.new_context(options)?;

        info!(command = input, "Running command");
        context.queue_initial_command_execution(input, chain, source.clone(), callback);
        Ok(self.finish(input, context, &source, &result, options))
    }

    fn finish(
        &self,
        target: &str,
        mut context: ExecutionContext<ScriptSource>,
        source: &ScriptSource,
        result: &Cell<Option<(bool, i32)>>,
        options: &ExecOptions,
    ) -> String {
        let started_at = Utc::now().to_rfc3339();
        let started = Instant::now();
        let outcome = context.run_command_queue();
        let elapsed_ms = started.elapsed().as_millis();
        context.close();

        let reported = result.get();
        let summary = RunSummary {
            target: target.to_string(),
            started_at,
            outcome: outcome_label(outcome),
            success: reported.map(|(success, _)| success),
            result: reported.and_then(|(success, value)| success.then_some(value)),
            commands_executed: context.commands_executed(),
            pending: context.pending(),
            elapsed_ms,
            output: source.output(),
        };
        debug!(
            outcome = summary.outcome,
            commands = summary.commands_executed,
            "Run finished"
        );
        if options.format == "json" {
            format_run_summary_json(&summary)
        } else {
            format_run_summary_text(&summary)
        }
    }

    fn list_functions(&self, functions: Option<&Path>, namespace: &str) -> Result<String, ExecError> {
        let source = ScriptSource::new(CONSOLE_SOURCE);
        source.load_functions(&self.functions_dir(functions), namespace)?;
        Ok(format_function_list_text(namespace, &source.function_ids()))
    }
}

/// Callback that remembers the last result reported to it.
fn result_recorder() -> (CommandResultCallback, Rc<Cell<Option<(bool, i32)>>>) {
    let result = Rc::new(Cell::new(None));
    let sink = Rc::clone(&result);
    let callback = CommandResultCallback::new(move |success, value| {
        sink.set(Some((success, value)));
    });
    (callback, result)
}
