//! Command quota and queue ceiling behavior.

use super::test_utils::{context, context_with, run_command, source_with};
use cmdexec::builtins::ScriptSource;
use cmdexec::execution::{
    CommandQueueEntry, EntryAction, ExecutionControl, ExecutionLimits, Frame, FrameControl,
    RunOutcome,
};
use cmdexec::source::CommandResultCallback;
use std::cell::Cell;
use std::rc::Rc;

fn top_frame() -> Frame {
    Frame::new(0, CommandResultCallback::EMPTY, FrameControl::ClearQueue)
}

fn counting(counter: &Rc<Cell<usize>>) -> EntryAction<ScriptSource> {
    let counter = Rc::clone(counter);
    EntryAction::custom(move |control: &mut ExecutionControl<'_, ScriptSource>| {
        control.increment_cost();
        counter.set(counter.get() + 1);
    })
}

#[test]
fn test_entries_without_cost_do_not_consume_quota() {
    let mut ctx = context(1);
    let ran = Rc::new(Cell::new(0));
    for _ in 0..5 {
        let ran = Rc::clone(&ran);
        ctx.queue_next(CommandQueueEntry::new(
            top_frame(),
            EntryAction::custom(move |_: &mut ExecutionControl<'_, ScriptSource>| {
                ran.set(ran.get() + 1)
            }),
        ));
    }
    assert_eq!(ctx.run_command_queue(), RunOutcome::Completed);
    assert_eq!(ran.get(), 5);
    assert_eq!(ctx.command_quota(), 1);
}

#[test]
fn test_quota_left_at_zero_stops_further_runs() {
    let mut ctx = context(2);
    let ran = Rc::new(Cell::new(0));
    for _ in 0..3 {
        ctx.queue_next(CommandQueueEntry::new(top_frame(), counting(&ran)));
    }
    assert_eq!(ctx.run_command_queue(), RunOutcome::QuotaExhausted);
    assert_eq!(ran.get(), 2);

    // A second run on the same context does nothing.
    assert_eq!(ctx.run_command_queue(), RunOutcome::QuotaExhausted);
    assert_eq!(ran.get(), 2);
    assert_eq!(ctx.pending(), 1);
}

#[test]
fn test_overflow_during_run_aborts_and_drops_later_work() {
    let mut ctx = context_with(ExecutionLimits {
        command_limit: 1_000,
        fork_limit: 16,
        max_queue_size: 4,
    });
    let ran = Rc::new(Cell::new(0));
    let inner = Rc::clone(&ran);
    ctx.queue_next(CommandQueueEntry::new(
        top_frame(),
        EntryAction::custom(move |control: &mut ExecutionControl<'_, ScriptSource>| {
            for _ in 0..10 {
                control.queue_next(counting(&inner));
            }
        }),
    ));

    assert_eq!(ctx.run_command_queue(), RunOutcome::Overflowed);
    assert!(ctx.queue_overflowed());
    assert_eq!(ctx.pending(), 0);
    assert_eq!(ran.get(), 0);

    ctx.queue_next(CommandQueueEntry::new(top_frame(), counting(&ran)));
    assert_eq!(ctx.pending(), 0);
    assert_eq!(ctx.run_command_queue(), RunOutcome::Overflowed);
    assert_eq!(ran.get(), 0);
}

#[test]
fn test_runaway_recursion_is_bounded_by_quota() {
    let source = source_with(&[("t:loop", "say tick\nfunction t:loop")]);
    let mut ctx = context(50);
    let (outcome, _) = run_command(&mut ctx, &source, "function t:loop");

    assert_eq!(outcome, RunOutcome::QuotaExhausted);
    assert_eq!(ctx.command_quota(), 0);
    assert!(!source.output().is_empty());
    assert!(source.output().len() < 50);
}
