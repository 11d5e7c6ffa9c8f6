//! Function calls
//!
//! Entering a function opens a frame one level deeper and schedules the body
//! in order, each line bound to the caller's source.

use super::continuation::{ContinuationItems, ContinuationTask};
use crate::execution::context::ExecutionContext;
use crate::execution::frame::Frame;
use crate::function::InstantiatedFunction;
use crate::source::{CommandResultCallback, ExecutionCommandSource};
use std::rc::Rc;

pub struct CallFunction<S> {
    function: Rc<InstantiatedFunction<S>>,
    result_callback: CommandResultCallback,
    return_parent_frame: bool,
}

impl<S> Clone for CallFunction<S> {
    fn clone(&self) -> Self {
        Self {
            function: Rc::clone(&self.function),
            result_callback: self.result_callback.clone(),
            return_parent_frame: self.return_parent_frame,
        }
    }
}

impl<S> CallFunction<S> {
    /// `return_parent_frame` makes a return inside the function also end the
    /// caller's frame, as `return run function ...` does.
    pub fn new(
        function: Rc<InstantiatedFunction<S>>,
        result_callback: CommandResultCallback,
        return_parent_frame: bool,
    ) -> Self {
        Self {
            function,
            result_callback,
            return_parent_frame,
        }
    }

    pub fn function_id(&self) -> &str {
        self.function.id()
    }
}

impl<S: ExecutionCommandSource> CallFunction<S> {
    pub(crate) fn execute(&self, source: &S, context: &mut ExecutionContext<S>, frame: &Frame) {
        context.increment_cost();
        let entries = self.function.entries();
        if let Some(tracer) = context.tracer() {
            tracer.on_call(frame.depth(), self.function.id(), entries.len());
        }
        let depth = frame.depth() + 1;
        let control = if self.return_parent_frame {
            frame.frame_control()
        } else {
            context.frame_control_for_depth(depth)
        };
        let body_frame = Frame::new(depth, self.result_callback.clone(), control);
        ContinuationTask::schedule(
            context,
            body_frame,
            ContinuationItems::Actions {
                source: source.clone(),
                actions: Rc::clone(entries),
            },
        );
    }
}
