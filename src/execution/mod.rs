//! Command execution engine
//!
//! A cooperative, single-threaded scheduler for chains of command invocations.
//! Callers seed an [`ExecutionContext`] with a function call or a parsed
//! command, run the queue, and close the context. Each popped
//! [`CommandQueueEntry`] runs to completion and may stage follow-up entries,
//! which are prepended so execution order matches a depth-first call stack.

mod context;
mod control;
mod custom;
mod entry;
mod frame;
pub mod tasks;
mod trace;

pub use context::{ExecutionContext, ExecutionLimits, RunOutcome, DEFAULT_MAX_QUEUE_SIZE};
pub use control::ExecutionControl;
pub use custom::{CustomCommandExecutor, CustomModifierExecutor, WithErrorHandling};
pub use entry::{CommandQueueEntry, ControlFn, EntryAction, UnboundControlFn, UnboundEntryAction};
pub use frame::{Frame, FrameControl, FrameControlTarget};
pub use trace::{JsonTraceCallbacks, LogTraceCallbacks, TraceCallbacks};
