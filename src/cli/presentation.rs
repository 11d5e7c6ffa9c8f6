//! CLI presentation: run summaries and function listings as text or JSON.

use crate::execution::RunOutcome;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;

/// What the CLI reports after a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: String,
    /// RFC 3339 timestamp of when the run started.
    pub started_at: String,
    pub outcome: &'static str,
    /// `None` when nothing reported a result.
    pub success: Option<bool>,
    pub result: Option<i32>,
    pub commands_executed: u64,
    pub pending: usize,
    pub elapsed_ms: u128,
    pub output: Vec<String>,
}

pub fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::QuotaExhausted => "quota_exhausted",
        RunOutcome::Overflowed => "overflowed",
    }
}

pub fn format_run_summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    for line in &summary.output {
        out.push_str(line);
        out.push('\n');
    }
    if !summary.output.is_empty() {
        out.push('\n');
    }

    let result = match (summary.success, summary.result) {
        (Some(true), Some(value)) => value.to_string(),
        (Some(false), _) => "failed".to_string(),
        _ => "-".to_string(),
    };
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Target", "Outcome", "Result", "Commands", "Pending", "Time"]);
    table.add_row(vec![
        summary.target.clone(),
        summary.outcome.to_string(),
        result,
        summary.commands_executed.to_string(),
        summary.pending.to_string(),
        format!("{}ms", summary.elapsed_ms),
    ]);
    out.push_str(&table.to_string());
    out
}

pub fn format_run_summary_json(summary: &RunSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_function_list_text(namespace: &str, ids: &[String]) -> String {
    if ids.is_empty() {
        return format!("No functions found in namespace '{}'", namespace);
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Function"]);
    for id in ids {
        table.add_row(vec![id.clone()]);
    }
    table.to_string()
}
