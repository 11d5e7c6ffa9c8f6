//! CLI domain: parse, route, output, and presentation only.
//! The route table builds an execution context per command and hands the
//! result to presentation.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ExecOptions};
pub use presentation::{
    format_function_list_text, format_run_summary_json, format_run_summary_text, RunSummary,
};
pub use route::RunContext;
