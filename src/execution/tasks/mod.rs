//! Built-in step kinds the scheduler knows how to run.

mod build_contexts;
mod call_function;
mod continuation;
mod execute_command;
mod fallthrough;
mod isolated_call;

pub use build_contexts::{BuildContexts, BuildContinuation, TopLevelCommand};
pub use call_function::CallFunction;
pub use continuation::{ContinuationItems, ContinuationTask};
pub use execute_command::ExecuteCommand;
pub use fallthrough::FallthroughTask;
pub use isolated_call::{IsolatedCall, IsolatedProducer};
