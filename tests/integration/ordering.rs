//! Depth-first ordering of queued work and the basic quota scenarios.

use super::test_utils::{context, run_function, source_with};
use cmdexec::builtins::ScriptSource;
use cmdexec::execution::{
    CommandQueueEntry, EntryAction, ExecutionContext, ExecutionControl, Frame, FrameControl,
    RunOutcome,
};
use cmdexec::source::CommandResultCallback;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn top_frame() -> Frame {
    Frame::new(0, CommandResultCallback::EMPTY, FrameControl::ClearQueue)
}

fn logging(log: &Log, name: &'static str) -> EntryAction<ScriptSource> {
    let log = Rc::clone(log);
    EntryAction::custom(move |_: &mut ExecutionControl<'_, ScriptSource>| {
        log.borrow_mut().push(name)
    })
}

fn queue_top(ctx: &mut ExecutionContext<ScriptSource>, action: EntryAction<ScriptSource>) {
    ctx.queue_next(CommandQueueEntry::new(top_frame(), action));
}

#[test]
fn test_children_run_before_pending_siblings() {
    let mut ctx = context(100);
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let inner = Rc::clone(&log);
    queue_top(
        &mut ctx,
        EntryAction::custom(move |control: &mut ExecutionControl<'_, ScriptSource>| {
            inner.borrow_mut().push("parent");
            let mut nested = control.nested(CommandResultCallback::EMPTY);
            let grandchild_log = Rc::clone(&inner);
            nested.queue_next(EntryAction::custom(
                move |control: &mut ExecutionControl<'_, ScriptSource>| {
                    grandchild_log.borrow_mut().push("a");
                    control.queue_next(logging(&grandchild_log, "a1"));
                },
            ));
            nested.queue_next(logging(&inner, "b"));
        }),
    );
    queue_top(&mut ctx, logging(&log, "sibling"));

    assert_eq!(ctx.run_command_queue(), RunOutcome::Completed);
    assert_eq!(*log.borrow(), vec!["parent", "a", "a1", "b", "sibling"]);
}

#[test]
fn test_simple_chain_consumes_two_commands() {
    let mut ctx = context(10);
    queue_top(
        &mut ctx,
        EntryAction::custom(|control: &mut ExecutionControl<'_, ScriptSource>| {
            control.increment_cost();
            control.queue_next(EntryAction::custom(
                |control: &mut ExecutionControl<'_, ScriptSource>| control.increment_cost(),
            ));
        }),
    );

    assert_eq!(ctx.run_command_queue(), RunOutcome::Completed);
    assert_eq!(ctx.command_quota(), 8);
    assert_eq!(ctx.commands_executed(), 2);
}

#[test]
fn test_exhaustion_stops_after_one_entry() {
    let mut ctx = context(1);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second"] {
        let log = Rc::clone(&log);
        queue_top(
            &mut ctx,
            EntryAction::custom(move |control: &mut ExecutionControl<'_, ScriptSource>| {
                control.increment_cost();
                log.borrow_mut().push(name);
            }),
        );
    }

    assert_eq!(ctx.run_command_queue(), RunOutcome::QuotaExhausted);
    assert_eq!(*log.borrow(), vec!["first"]);
    // Quota exhaustion leaves the remaining work where it was.
    assert_eq!(ctx.pending(), 1);
    assert!(!ctx.queue_overflowed());
}

#[test]
fn test_fork_then_cancel_runs_nothing() {
    let mut ctx = context(100);
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let inner = Rc::clone(&log);
    queue_top(
        &mut ctx,
        EntryAction::custom(move |control: &mut ExecutionControl<'_, ScriptSource>| {
            let mut nested = control.nested(CommandResultCallback::EMPTY);
            for name in ["one", "two", "three"] {
                nested.queue_next(logging(&inner, name));
            }
            nested.discard_current_frame();
        }),
    );

    assert_eq!(ctx.run_command_queue(), RunOutcome::Completed);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_function_body_runs_in_order() {
    let source = source_with(&[
        ("t:main", "say one\nfunction t:nested\nsay four"),
        ("t:nested", "say two\nsay three"),
    ]);
    let mut ctx = context(100);
    let (outcome, results) = run_function(&mut ctx, &source, "t:main");

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(results.borrow().is_empty());
    assert_eq!(
        source.output(),
        vec![
            "[console] one",
            "[console] two",
            "[console] three",
            "[console] four"
        ]
    );
}

#[test]
fn test_function_quota_counts_calls_and_commands() {
    let source = source_with(&[("t:many", "say 1\nsay 2\nsay 3\nsay 4\nsay 5")]);
    let mut ctx = context(3);
    let (outcome, _) = run_function(&mut ctx, &source, "t:many");

    // One for the call itself, then one per executed command.
    assert_eq!(outcome, RunOutcome::QuotaExhausted);
    assert_eq!(source.output(), vec!["[console] 1", "[console] 2"]);
    assert_eq!(ctx.commands_executed(), 3);
}
