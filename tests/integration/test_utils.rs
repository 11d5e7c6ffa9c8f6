//! Shared helpers for driving an execution context from tests.

use cmdexec::builtins::ScriptSource;
use cmdexec::execution::{ExecutionContext, ExecutionLimits, RunOutcome};
use cmdexec::profiler::InactiveProfiler;
use cmdexec::source::{CommandResultCallback, ExecutionCommandSource};
use std::cell::RefCell;
use std::rc::Rc;

pub type Results = Rc<RefCell<Vec<(bool, i32)>>>;

pub fn context(command_limit: usize) -> ExecutionContext<ScriptSource> {
    ExecutionContext::new(command_limit, 64, Box::new(InactiveProfiler))
}

pub fn context_with(limits: ExecutionLimits) -> ExecutionContext<ScriptSource> {
    ExecutionContext::with_limits(limits, Box::new(InactiveProfiler))
}

/// Callback that records every result reported to it.
pub fn recorder() -> (CommandResultCallback, Results) {
    let results: Results = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&results);
    let callback = CommandResultCallback::new(move |success, value| {
        sink.borrow_mut().push((success, value));
    });
    (callback, results)
}

/// Source with the given functions compiled into its library.
pub fn source_with(functions: &[(&str, &str)]) -> ScriptSource {
    let source = ScriptSource::new("console");
    for (id, body) in functions {
        source.define_function(id, body).unwrap();
    }
    source
}

/// Parse `input` for `source` and seed it as the context's top-level command.
pub fn queue_command(
    context: &mut ExecutionContext<ScriptSource>,
    source: &ScriptSource,
    input: &str,
    callback: CommandResultCallback,
) {
    let source = source.with_callback(callback.clone());
    let chain = source.dispatcher().parse(input, &source).unwrap();
    context.queue_initial_command_execution(input, chain, source, callback);
}

/// Call function `id` and run the queue.
pub fn run_function(
    context: &mut ExecutionContext<ScriptSource>,
    source: &ScriptSource,
    id: &str,
) -> (RunOutcome, Results) {
    let (callback, results) = recorder();
    let function = source.function(id).unwrap();
    context.queue_initial_function_call(function, source.clone(), callback);
    (context.run_command_queue(), results)
}

/// Run a single command line to completion.
pub fn run_command(
    context: &mut ExecutionContext<ScriptSource>,
    source: &ScriptSource,
    input: &str,
) -> (RunOutcome, Results) {
    let (callback, results) = recorder();
    queue_command(context, source, input, callback);
    (context.run_command_queue(), results)
}
