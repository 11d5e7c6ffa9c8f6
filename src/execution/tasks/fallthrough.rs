use crate::execution::context::ExecutionContext;
use crate::execution::frame::Frame;

/// Reached when a `return run` chain produced no sources: the frame that was
/// waiting on a value fails instead.
pub struct FallthroughTask;

impl FallthroughTask {
    pub(crate) fn execute<S>(context: &mut ExecutionContext<S>, frame: &Frame) {
        frame.return_failure(context);
    }
}
