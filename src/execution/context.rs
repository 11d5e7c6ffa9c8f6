//! Execution Context
//!
//! The scheduler core. Owns the work queue, the command quota and the tracer,
//! and drives the run loop. Work is kept in an explicit queue rather than on
//! the native call stack: nested calls push entries to the front, so the
//! queue reads as a depth-ordered stack of pending continuations.

use super::entry::{CommandQueueEntry, EntryAction, UnboundEntryAction};
use super::frame::{Frame, FrameControl, FrameControlTarget};
use super::tasks::{BuildContexts, CallFunction};
use super::trace::TraceCallbacks;
use crate::chain::ContextChain;
use crate::function::InstantiatedFunction;
use crate::profiler::ProfilerFiller;
use crate::source::{CommandResultCallback, ExecutionCommandSource};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{error, info, trace};

/// Hard ceiling on queued plus staged entries unless configured otherwise.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000_000;

/// Limits fixed for the lifetime of one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Total commands a run may execute.
    pub command_limit: usize,
    /// Maximum branches a single redirect may create.
    pub fork_limit: usize,
    /// Maximum pending entries before the run is aborted.
    pub max_queue_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            command_limit: 65_536,
            fork_limit: 65_536,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }
}

/// How a call to [`ExecutionContext::run_command_queue`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue drained.
    Completed,
    /// The command quota ran out; remaining work was left in the queue.
    QuotaExhausted,
    /// Pending work exceeded the queue ceiling and was discarded.
    Overflowed,
}

pub struct ExecutionContext<S> {
    limits: ExecutionLimits,
    profiler: Box<dyn ProfilerFiller>,
    tracer: Option<Box<dyn TraceCallbacks>>,
    command_quota: i64,
    queue_overflow: bool,
    command_queue: VecDeque<CommandQueueEntry<S>>,
    new_top_commands: Vec<CommandQueueEntry<S>>,
    current_frame_depth: usize,
}

impl<S> ExecutionContext<S> {
    pub fn new(command_limit: usize, fork_limit: usize, profiler: Box<dyn ProfilerFiller>) -> Self {
        Self::with_limits(
            ExecutionLimits {
                command_limit,
                fork_limit,
                ..ExecutionLimits::default()
            },
            profiler,
        )
    }

    pub fn with_limits(limits: ExecutionLimits, profiler: Box<dyn ProfilerFiller>) -> Self {
        Self {
            limits,
            profiler,
            tracer: None,
            command_quota: i64::try_from(limits.command_limit).unwrap_or(i64::MAX),
            queue_overflow: false,
            command_queue: VecDeque::new(),
            new_top_commands: Vec::new(),
            current_frame_depth: 0,
        }
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    pub fn fork_limit(&self) -> usize {
        self.limits.fork_limit
    }

    pub fn command_quota(&self) -> i64 {
        self.command_quota
    }

    /// Commands charged against the quota so far.
    pub fn commands_executed(&self) -> u64 {
        let limit = i64::try_from(self.limits.command_limit).unwrap_or(i64::MAX);
        u64::try_from(limit.saturating_sub(self.command_quota)).unwrap_or(0)
    }

    pub fn queue_overflowed(&self) -> bool {
        self.queue_overflow
    }

    /// Entries queued or staged and not yet executed.
    pub fn pending(&self) -> usize {
        self.command_queue.len() + self.new_top_commands.len()
    }

    pub fn current_frame_depth(&self) -> usize {
        self.current_frame_depth
    }

    pub fn profiler(&mut self) -> &mut dyn ProfilerFiller {
        &mut *self.profiler
    }

    pub fn tracer(&mut self) -> Option<&mut dyn TraceCallbacks> {
        self.tracer
            .as_deref_mut()
            .map(|tracer| tracer as &mut dyn TraceCallbacks)
    }

    pub fn has_tracer(&self) -> bool {
        self.tracer.is_some()
    }

    /// Install a tracer, returning the one it replaces. The replaced tracer is
    /// handed back open; closing it becomes the caller's job.
    pub fn set_tracer(
        &mut self,
        tracer: Box<dyn TraceCallbacks>,
    ) -> Option<Box<dyn TraceCallbacks>> {
        self.tracer.replace(tracer)
    }

    pub fn take_tracer(&mut self) -> Option<Box<dyn TraceCallbacks>> {
        self.tracer.take()
    }

    /// Charge one command against the quota.
    pub fn increment_cost(&mut self) {
        self.command_quota -= 1;
    }

    /// Stage `entry` to run before anything already queued.
    ///
    /// If the pending total would exceed the ceiling the run overflows: all
    /// pending work is dropped along with `entry`, and every later call is a
    /// no-op.
    pub fn queue_next(&mut self, entry: CommandQueueEntry<S>) {
        if self.queue_overflow {
            return;
        }
        if self.pending() + 1 > self.limits.max_queue_size {
            self.queue_overflow = true;
            self.command_queue.clear();
            self.new_top_commands.clear();
            return;
        }
        self.new_top_commands.push(entry);
    }

    /// Remove entries from the front of the queue while they sit at `depth` or
    /// deeper. Staged entries at that depth are dropped too; shallower staged
    /// entries keep their order.
    pub fn discard_at_depth_or_higher(&mut self, depth: usize) {
        self.new_top_commands
            .retain(|entry| entry.frame().depth() < depth);
        while self
            .command_queue
            .front()
            .is_some_and(|entry| entry.frame().depth() >= depth)
        {
            self.command_queue.pop_front();
        }
    }

    pub fn frame_control_for_depth(&self, depth: usize) -> FrameControl {
        FrameControl::DiscardFrom(depth)
    }

    /// Release the tracer. Safe to call more than once; also runs on drop.
    pub fn close(&mut self) {
        if let Some(mut tracer) = self.tracer.take() {
            tracer.close();
        }
    }

    fn push_new_commands(&mut self) {
        if self.new_top_commands.is_empty() {
            return;
        }
        trace!(
            staged = self.new_top_commands.len(),
            queued = self.command_queue.len(),
            "Flushing staged commands"
        );
        for entry in self.new_top_commands.drain(..).rev() {
            self.command_queue.push_front(entry);
        }
    }

    fn create_top_frame(&self, return_callback: CommandResultCallback) -> Frame {
        if self.current_frame_depth == 0 {
            Frame::new(0, return_callback, FrameControl::ClearQueue)
        } else {
            let depth = self.current_frame_depth + 1;
            Frame::new(depth, return_callback, self.frame_control_for_depth(depth))
        }
    }
}

impl<S: ExecutionCommandSource> ExecutionContext<S> {
    /// Seed the context with a call to `function` on behalf of `source`.
    ///
    /// The function's return value, if it returns one, is reported to
    /// `return_callback`.
    pub fn queue_initial_function_call(
        &mut self,
        function: Rc<InstantiatedFunction<S>>,
        source: S,
        return_callback: CommandResultCallback,
    ) {
        let frame = self.create_top_frame(return_callback.clone());
        let action = UnboundEntryAction::CallFunction(CallFunction::new(
            function,
            return_callback,
            false,
        ));
        self.queue_next(CommandQueueEntry::new(frame, action.bind(source)));
    }

    /// Seed the context with a single parsed command.
    pub fn queue_initial_command_execution(
        &mut self,
        input: impl Into<String>,
        chain: ContextChain<S>,
        source: S,
        return_callback: CommandResultCallback,
    ) {
        let frame = self.create_top_frame(return_callback);
        let action = EntryAction::TopLevel(BuildContexts::new(input, chain).top_level(source));
        self.queue_next(CommandQueueEntry::new(frame, action));
    }

    /// Run queued work until the queue drains, the quota runs out, or the
    /// queue overflows. Neither stop condition is an error.
    pub fn run_command_queue(&mut self) -> RunOutcome {
        if self.queue_overflow {
            return RunOutcome::Overflowed;
        }
        self.push_new_commands();
        let outcome = loop {
            if self.command_quota <= 0 {
                info!(
                    command_limit = self.limits.command_limit,
                    "Command execution stopped due to limit (executed {} commands)",
                    self.limits.command_limit
                );
                break RunOutcome::QuotaExhausted;
            }
            let Some(entry) = self.command_queue.pop_front() else {
                break RunOutcome::Completed;
            };
            self.current_frame_depth = entry.frame().depth();
            entry.execute(self);
            if self.queue_overflow {
                error!(
                    max_queue_size = self.limits.max_queue_size,
                    "Command execution stopped due to command queue overflow (max {})",
                    self.limits.max_queue_size
                );
                break RunOutcome::Overflowed;
            }
            self.push_new_commands();
        };
        self.current_frame_depth = 0;
        outcome
    }
}

impl<S> FrameControlTarget for ExecutionContext<S> {
    fn discard_at_depth_or_higher(&mut self, depth: usize) {
        ExecutionContext::discard_at_depth_or_higher(self, depth);
    }

    fn clear_queue(&mut self) {
        self.command_queue.clear();
        self.new_top_commands.clear();
    }
}

impl<S> Drop for ExecutionContext<S> {
    fn drop(&mut self) {
        self.close();
    }
}
