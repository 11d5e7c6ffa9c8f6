//! Custom executors
//!
//! Commands and redirect modifiers that want to queue follow-up work instead
//! of returning a value synchronously implement these traits.

use super::control::ExecutionControl;
use crate::chain::{ChainModifiers, ContextChain};
use crate::error::CommandSyntaxError;
use crate::source::ExecutionCommandSource;

/// An execute stage that hooks into the scheduler.
pub trait CustomCommandExecutor<S> {
    fn run(
        &self,
        source: &S,
        chain: &ContextChain<S>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, S>,
    );
}

/// A [`CustomCommandExecutor`] whose body may fail with a command error.
///
/// Errors are reported through `source.handle_error` and then `on_error`,
/// which by default fails the source's result callback.
pub trait WithErrorHandling<S: ExecutionCommandSource> {
    fn run_guarded(
        &self,
        source: &S,
        chain: &ContextChain<S>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, S>,
    ) -> Result<(), CommandSyntaxError>;

    fn on_error(
        &self,
        _error: &CommandSyntaxError,
        source: &S,
        _modifiers: ChainModifiers,
        _control: &mut ExecutionControl<'_, S>,
    ) {
        source.callback().on_failure();
    }
}

impl<S, T> CustomCommandExecutor<S> for T
where
    S: ExecutionCommandSource,
    T: WithErrorHandling<S>,
{
    fn run(
        &self,
        source: &S,
        chain: &ContextChain<S>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, S>,
    ) {
        if let Err(err) = self.run_guarded(source, chain, modifiers, control) {
            source.handle_error(&err, modifiers.is_forked(), control.tracer());
            self.on_error(&err, source, modifiers, control);
        }
    }
}

/// A modify stage that takes over the rest of the chain.
///
/// Implementations receive every resolved source and must never queue more
/// than `control.fork_limit()` continuations.
pub trait CustomModifierExecutor<S> {
    fn apply(
        &self,
        original_source: &S,
        sources: &[S],
        chain: &ContextChain<S>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, S>,
    );
}
