//! Runs the execute stage of a chain for one source.

use crate::chain::{ChainModifiers, ContextChain};
use crate::execution::context::ExecutionContext;
use crate::execution::frame::Frame;
use crate::source::ExecutionCommandSource;
use std::rc::Rc;

pub struct ExecuteCommand<S> {
    command_input: Rc<str>,
    modifiers: ChainModifiers,
    chain: ContextChain<S>,
}

impl<S> Clone for ExecuteCommand<S> {
    fn clone(&self) -> Self {
        Self {
            command_input: Rc::clone(&self.command_input),
            modifiers: self.modifiers,
            chain: self.chain.clone(),
        }
    }
}

impl<S> ExecuteCommand<S> {
    pub fn new(command_input: Rc<str>, modifiers: ChainModifiers, chain: ContextChain<S>) -> Self {
        Self {
            command_input,
            modifiers,
            chain,
        }
    }

    pub fn command_input(&self) -> &str {
        &self.command_input
    }
}

impl<S: ExecutionCommandSource> ExecuteCommand<S> {
    pub(crate) fn execute(&self, source: &S, context: &mut ExecutionContext<S>, frame: &Frame) {
        context
            .profiler()
            .push(&format!("execute {}", self.command_input));
        context.increment_cost();
        let forked = self.modifiers.is_forked();
        match self.chain.run_executable(source, forked) {
            Ok(result) => {
                if let Some(tracer) = context.tracer() {
                    tracer.on_return(frame.depth(), &self.command_input, result);
                }
            }
            Err(err) => source.handle_error(&err, forked, context.tracer()),
        }
        context.profiler().pop();
    }
}
