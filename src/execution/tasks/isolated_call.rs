//! Isolated calls
//!
//! Runs a producer in a fresh frame one level deeper whose return value goes
//! to a dedicated callback, so whatever the producer queues can return
//! without ending the caller's frame.

use crate::execution::context::ExecutionContext;
use crate::execution::control::ExecutionControl;
use crate::execution::frame::Frame;
use crate::source::CommandResultCallback;

pub type IsolatedProducer<S> = dyn FnOnce(&mut ExecutionControl<'_, S>);

pub struct IsolatedCall<S> {
    producer: Box<IsolatedProducer<S>>,
    output: CommandResultCallback,
}

impl<S> IsolatedCall<S> {
    pub fn new<F>(producer: F, output: CommandResultCallback) -> Self
    where
        F: FnOnce(&mut ExecutionControl<'_, S>) + 'static,
    {
        Self {
            producer: Box::new(producer),
            output,
        }
    }

    pub(crate) fn execute(self, context: &mut ExecutionContext<S>, frame: &Frame) {
        let depth = frame.depth() + 1;
        let isolated = Frame::new(depth, self.output, context.frame_control_for_depth(depth));
        let mut control = ExecutionControl::new(context, isolated);
        (self.producer)(&mut control);
    }
}
