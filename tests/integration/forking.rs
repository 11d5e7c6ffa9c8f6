//! Redirects that fan one command out over several sources.

use super::test_utils::{context, context_with, recorder, run_command, run_function, source_with};
use cmdexec::execution::{ExecutionLimits, RunOutcome, TraceCallbacks};
use cmdexec::source::{CommandResultCallback, ExecutionCommandSource};
use std::cell::RefCell;
use std::rc::Rc;

/// Tracer that only keeps error messages.
struct Errors(Rc<RefCell<Vec<String>>>);

impl TraceCallbacks for Errors {
    fn on_command(&mut self, _depth: usize, _command: &str) {}
    fn on_return(&mut self, _depth: usize, _command: &str, _result: i32) {}
    fn on_error(&mut self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
    fn on_call(&mut self, _depth: usize, _function: &str, _command_count: usize) {}
}

#[test]
fn test_execute_as_runs_once_per_source_in_order() {
    let source = source_with(&[]);
    let mut ctx = context(100);
    let (outcome, results) = run_command(&mut ctx, &source, "execute as a,b,c run say hi");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(source.output(), vec!["[a] hi", "[b] hi", "[c] hi"]);
    // Each branch reports through its own copy of the callback.
    assert_eq!(*results.borrow(), vec![(true, 1), (true, 1), (true, 1)]);
}

#[test]
fn test_nested_forks_multiply() {
    let source = source_with(&[]);
    let mut ctx = context(100);
    run_command(&mut ctx, &source, "execute as a,b run execute as x,y run say hi");

    assert_eq!(
        source.output(),
        vec!["[x] hi", "[y] hi", "[x] hi", "[y] hi"]
    );
}

#[test]
fn test_fork_limit_stops_redirect() {
    let source = source_with(&[]);
    let errors = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = context_with(ExecutionLimits {
        command_limit: 100,
        fork_limit: 3,
        ..ExecutionLimits::default()
    });
    ctx.set_tracer(Box::new(Errors(Rc::clone(&errors))));

    let (outcome, results) = run_command(
        &mut ctx,
        &source,
        "execute as a,b run execute as x,y run say hi",
    );

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(source.output().is_empty());
    assert!(results.borrow().is_empty());
    assert_eq!(*errors.borrow(), vec!["Maximum number of contexts (3) reached"]);
}

#[test]
fn test_exactly_fork_limit_sources_is_allowed() {
    let source = source_with(&[]);
    let mut ctx = context_with(ExecutionLimits {
        command_limit: 100,
        fork_limit: 3,
        ..ExecutionLimits::default()
    });
    run_command(&mut ctx, &source, "execute as a,b,c run say hi");
    assert_eq!(source.output().len(), 3);
}

#[test]
fn test_forked_failures_do_not_stop_siblings_or_caller() {
    let source = source_with(&[("t:main", "execute as a,b run fail boom\nsay done")]);
    let (callback, results) = recorder();
    let watched = source.with_callback(callback);
    let mut ctx = context(100);
    let function = source.function("t:main").unwrap();
    ctx.queue_initial_function_call(function, watched, CommandResultCallback::EMPTY);
    assert_eq!(ctx.run_command_queue(), RunOutcome::Completed);

    // Both branches failed quietly; the rest of the function still ran.
    assert_eq!(*results.borrow(), vec![(false, 0), (false, 0), (true, 1)]);
    assert_eq!(source.output(), vec!["[console] done"]);
}

#[test]
fn test_unforked_failure_is_reported_and_function_continues() {
    let source = source_with(&[("t:main", "fail boom\nsay done")]);
    let mut ctx = context(100);
    run_function(&mut ctx, &source, "t:main");

    assert_eq!(
        source.output(),
        vec!["[console] error: boom", "[console] done"]
    );
}
