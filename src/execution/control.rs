//! Execution Control
//!
//! The narrow handle a running step gets instead of the context itself. It
//! can queue work at its own frame or a freshly derived deeper one, charge
//! cost, and reach the shared tracer. It cannot inspect or reorder the queue.

use super::context::ExecutionContext;
use super::entry::{CommandQueueEntry, EntryAction};
use super::frame::{Frame, FrameControl, FrameControlTarget};
use super::trace::TraceCallbacks;
use crate::source::CommandResultCallback;

pub struct ExecutionControl<'a, S> {
    context: &'a mut ExecutionContext<S>,
    frame: Frame,
}

impl<'a, S> ExecutionControl<'a, S> {
    pub fn new(context: &'a mut ExecutionContext<S>, frame: Frame) -> Self {
        Self { context, frame }
    }

    /// Queue `action` to run next, bound to this control's frame.
    pub fn queue_next(&mut self, action: EntryAction<S>) {
        self.context
            .queue_next(CommandQueueEntry::new(self.frame.clone(), action));
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frame
    }

    pub fn frame_control_for_depth(&self, depth: usize) -> FrameControl {
        self.context.frame_control_for_depth(depth)
    }

    /// A control for a new frame one level below this one.
    pub fn nested(&mut self, return_value_consumer: CommandResultCallback) -> ExecutionControl<'_, S> {
        let depth = self.frame.depth() + 1;
        let frame = Frame::new(
            depth,
            return_value_consumer,
            self.context.frame_control_for_depth(depth),
        );
        ExecutionControl::new(self.context, frame)
    }

    pub fn fork_limit(&self) -> usize {
        self.context.fork_limit()
    }

    pub fn increment_cost(&mut self) {
        self.context.increment_cost();
    }

    pub fn tracer(&mut self) -> Option<&mut dyn TraceCallbacks> {
        self.context.tracer()
    }

    pub fn set_tracer(
        &mut self,
        tracer: Box<dyn TraceCallbacks>,
    ) -> Option<Box<dyn TraceCallbacks>> {
        self.context.set_tracer(tracer)
    }

    pub fn take_tracer(&mut self) -> Option<Box<dyn TraceCallbacks>> {
        self.context.take_tracer()
    }

    pub fn discard_current_frame(&mut self) {
        let frame = self.frame.clone();
        frame.discard(self);
    }

    pub fn return_success(&mut self, value: i32) {
        let frame = self.frame.clone();
        frame.return_success(self, value);
    }

    pub fn return_failure(&mut self) {
        let frame = self.frame.clone();
        frame.return_failure(self);
    }
}

impl<S> FrameControlTarget for ExecutionControl<'_, S> {
    fn discard_at_depth_or_higher(&mut self, depth: usize) {
        self.context.discard_at_depth_or_higher(depth);
    }

    fn clear_queue(&mut self) {
        FrameControlTarget::clear_queue(self.context);
    }
}
