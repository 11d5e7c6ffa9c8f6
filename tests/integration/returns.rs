//! Return values flowing from functions back to their callers.

use super::test_utils::{context, recorder, run_command, run_function, source_with};
use cmdexec::execution::RunOutcome;
use cmdexec::source::ExecutionCommandSource;

#[test]
fn test_return_value_ends_function() {
    let source = source_with(&[("t:calc", "say before\nreturn 7\nsay after")]);
    let mut ctx = context(100);
    let (outcome, results) = run_function(&mut ctx, &source, "t:calc");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(*results.borrow(), vec![(true, 7)]);
    assert_eq!(source.output(), vec!["[console] before"]);
}

#[test]
fn test_return_fail_reports_failure() {
    let source = source_with(&[("t:no", "return fail\nsay unreachable")]);
    let mut ctx = context(100);
    let (_, results) = run_function(&mut ctx, &source, "t:no");

    assert_eq!(*results.borrow(), vec![(false, 0)]);
    assert!(source.output().is_empty());
}

#[test]
fn test_function_without_return_reports_nothing() {
    let source = source_with(&[("t:quiet", "say hi")]);
    let mut ctx = context(100);
    let (_, results) = run_function(&mut ctx, &source, "t:quiet");

    assert!(results.borrow().is_empty());
    assert_eq!(source.output(), vec!["[console] hi"]);
}

#[test]
fn test_return_run_function_propagates_to_caller() {
    let source = source_with(&[
        ("t:outer", "return run function t:inner\nsay after"),
        ("t:inner", "say inner\nreturn 3\nsay inner after"),
    ]);
    let mut ctx = context(100);
    let (outcome, results) = run_function(&mut ctx, &source, "t:outer");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(*results.borrow(), vec![(true, 3)]);
    assert_eq!(source.output(), vec!["[console] inner"]);
}

#[test]
fn test_return_run_simple_command_reports_to_both_callbacks() {
    let source = source_with(&[]);
    let (source_callback, source_results) = recorder();
    let (return_callback, return_results) = recorder();
    let source = source.with_callback(source_callback);
    let chain = source
        .dispatcher()
        .parse("return run say hi", &source)
        .unwrap();

    let mut ctx = context(100);
    ctx.queue_initial_command_execution("return run say hi", chain, source.clone(), return_callback);
    assert_eq!(ctx.run_command_queue(), RunOutcome::Completed);

    assert_eq!(*source_results.borrow(), vec![(true, 1)]);
    assert_eq!(*return_results.borrow(), vec![(true, 1)]);
    assert_eq!(source.output(), vec!["[console] hi"]);
}

#[test]
fn test_return_run_with_no_sources_falls_through() {
    let source = source_with(&[
        (
            "t:outer",
            "return run execute if function t:zero run say passed\nsay after",
        ),
        ("t:zero", "return 0"),
    ]);
    let mut ctx = context(100);
    let (outcome, results) = run_function(&mut ctx, &source, "t:outer");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(*results.borrow(), vec![(false, 0)]);
    assert!(source.output().is_empty());
}

#[test]
fn test_execute_if_function_filters_sources() {
    let source = source_with(&[
        ("t:yes", "return 1"),
        ("t:no", "return 0"),
        ("t:silent", "say checked"),
    ]);
    let mut ctx = context(100);
    run_command(&mut ctx, &source, "execute if function t:yes run say passed");
    run_command(&mut ctx, &source, "execute if function t:no run say blocked");
    run_command(&mut ctx, &source, "execute if function t:silent run say blocked");

    assert_eq!(
        source.output(),
        vec!["[console] passed", "[console] checked"]
    );
}

#[test]
fn test_unknown_function_at_runtime_is_reported() {
    let source = source_with(&[("t:main", "function t:missing\nsay still running")]);
    let mut ctx = context(100);
    run_function(&mut ctx, &source, "t:main");

    let output = source.output();
    assert_eq!(output.len(), 2);
    assert!(output[0].contains("t:missing"));
    assert_eq!(output[1], "[console] still running");
}

#[test]
fn test_condition_function_results_stay_out_of_caller_callback() {
    let source = source_with(&[("t:check", "say checking\nreturn 1")]);
    let mut ctx = context(100);
    let (outcome, results) = run_command(&mut ctx, &source, "execute if function t:check run say hi");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(*results.borrow(), vec![(true, 1)]);
    assert_eq!(source.output(), vec!["[console] checking", "[console] hi"]);
}
