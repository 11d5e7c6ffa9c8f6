//! Queue entries and the actions they carry.

use super::context::ExecutionContext;
use super::control::ExecutionControl;
use super::frame::Frame;
use super::tasks::{
    BuildContexts, BuildContinuation, CallFunction, ContinuationTask, ExecuteCommand,
    FallthroughTask, IsolatedCall, TopLevelCommand,
};
use crate::source::ExecutionCommandSource;
use std::fmt;
use std::rc::Rc;

pub type ControlFn<S> = dyn FnOnce(&mut ExecutionControl<'_, S>);
pub type UnboundControlFn<S> = dyn Fn(&S, &mut ExecutionControl<'_, S>);

/// One step of work, already bound to a source where it needs one.
pub enum EntryAction<S> {
    /// Resolve and run a command handed to the context by a caller.
    TopLevel(TopLevelCommand<S>),
    /// Resume resolving a chain with an explicit set of sources.
    Continuation(BuildContinuation<S>),
    /// An unbound step paired with the source it runs for.
    Bound {
        source: S,
        action: UnboundEntryAction<S>,
    },
    /// Lazily schedules a list of steps, one per execution.
    Continue(ContinuationTask<S>),
    /// Fails the frame that was expecting a return value.
    Fallthrough,
    /// Runs a producer in a fresh, deeper frame.
    Isolated(IsolatedCall<S>),
    /// Arbitrary step that only sees an [`ExecutionControl`].
    Custom(Box<ControlFn<S>>),
}

impl<S> fmt::Debug for EntryAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            EntryAction::TopLevel(_) => "TopLevel",
            EntryAction::Continuation(_) => "Continuation",
            EntryAction::Bound { .. } => "Bound",
            EntryAction::Continue(_) => "Continue",
            EntryAction::Fallthrough => "Fallthrough",
            EntryAction::Isolated(_) => "Isolated",
            EntryAction::Custom(_) => "Custom",
        };
        f.write_str(kind)
    }
}

impl<S: ExecutionCommandSource> EntryAction<S> {
    pub fn custom<F>(f: F) -> Self
    where
        F: FnOnce(&mut ExecutionControl<'_, S>) + 'static,
    {
        EntryAction::Custom(Box::new(f))
    }

    pub(crate) fn execute(self, context: &mut ExecutionContext<S>, frame: &Frame) {
        match self {
            EntryAction::TopLevel(command) => command.execute(context, frame),
            EntryAction::Continuation(continuation) => continuation.execute(context, frame),
            EntryAction::Bound { source, action } => action.execute(&source, context, frame),
            EntryAction::Continue(task) => task.execute(context, frame),
            EntryAction::Fallthrough => FallthroughTask::execute(context, frame),
            EntryAction::Isolated(call) => call.execute(context, frame),
            EntryAction::Custom(f) => {
                let mut control = ExecutionControl::new(context, frame.clone());
                f(&mut control);
            }
        }
    }
}

/// A step still waiting for the source it will run for.
///
/// Function bodies are lists of these; calling the function binds each one
/// to the caller's source.
pub enum UnboundEntryAction<S> {
    /// One parsed command line.
    Command(BuildContexts<S>),
    Execute(ExecuteCommand<S>),
    CallFunction(CallFunction<S>),
    Custom(Rc<UnboundControlFn<S>>),
}

impl<S> Clone for UnboundEntryAction<S> {
    fn clone(&self) -> Self {
        match self {
            UnboundEntryAction::Command(c) => UnboundEntryAction::Command(c.clone()),
            UnboundEntryAction::Execute(e) => UnboundEntryAction::Execute(e.clone()),
            UnboundEntryAction::CallFunction(c) => UnboundEntryAction::CallFunction(c.clone()),
            UnboundEntryAction::Custom(f) => UnboundEntryAction::Custom(Rc::clone(f)),
        }
    }
}

impl<S> fmt::Debug for UnboundEntryAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnboundEntryAction::Command(c) => write!(f, "Command({:?})", c.command_input()),
            UnboundEntryAction::Execute(e) => write!(f, "Execute({:?})", e.command_input()),
            UnboundEntryAction::CallFunction(c) => write!(f, "CallFunction({:?})", c.function_id()),
            UnboundEntryAction::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl<S: ExecutionCommandSource> UnboundEntryAction<S> {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&S, &mut ExecutionControl<'_, S>) + 'static,
    {
        UnboundEntryAction::Custom(Rc::new(f))
    }

    pub fn bind(self, source: S) -> EntryAction<S> {
        EntryAction::Bound {
            source,
            action: self,
        }
    }

    pub(crate) fn execute(&self, source: &S, context: &mut ExecutionContext<S>, frame: &Frame) {
        match self {
            UnboundEntryAction::Command(command) => command.execute_unbound(source, context, frame),
            UnboundEntryAction::Execute(command) => command.execute(source, context, frame),
            UnboundEntryAction::CallFunction(call) => call.execute(source, context, frame),
            UnboundEntryAction::Custom(f) => {
                let mut control = ExecutionControl::new(context, frame.clone());
                f(source, &mut control);
            }
        }
    }
}

/// A unit of deferred work: an action and the frame it belongs to.
#[derive(Debug)]
pub struct CommandQueueEntry<S> {
    frame: Frame,
    action: EntryAction<S>,
}

impl<S> CommandQueueEntry<S> {
    pub fn new(frame: Frame, action: EntryAction<S>) -> Self {
        Self { frame, action }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl<S: ExecutionCommandSource> CommandQueueEntry<S> {
    pub(crate) fn execute(self, context: &mut ExecutionContext<S>) {
        let CommandQueueEntry { frame, action } = self;
        action.execute(context, &frame);
    }
}
