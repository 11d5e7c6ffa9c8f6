//! cmdexec: a bounded, depth-first command scheduler
//!
//! Executes chains of command invocations with an explicit command quota, a
//! fork fan-out limit, a hard ceiling on pending work, and frame-scoped
//! cancellation. Execution is single-threaded and cooperative; an explicit
//! work queue replaces native recursion.

pub mod builtins;
pub mod chain;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod execution;
pub mod function;
pub mod logging;
pub mod profiler;
pub mod source;
