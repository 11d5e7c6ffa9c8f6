//! Profiling hooks
//!
//! The scheduler brackets preparation and execution of each command with
//! `push`/`pop`. The default profiler does nothing.

use std::time::Instant;
use tracing::trace;

pub trait ProfilerFiller {
    fn push(&mut self, section: &str);

    fn pop(&mut self);
}

#[derive(Debug, Default)]
pub struct InactiveProfiler;

impl ProfilerFiller for InactiveProfiler {
    fn push(&mut self, _section: &str) {}

    fn pop(&mut self) {}
}

/// Emits a trace-level event with the elapsed time of every section.
#[derive(Debug, Default)]
pub struct TracingProfiler {
    sections: Vec<(String, Instant)>,
}

impl TracingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.sections.len()
    }
}

impl ProfilerFiller for TracingProfiler {
    fn push(&mut self, section: &str) {
        self.sections.push((section.to_string(), Instant::now()));
    }

    fn pop(&mut self) {
        if let Some((section, started)) = self.sections.pop() {
            trace!(
                section = %section,
                depth = self.sections.len(),
                duration_us = started.elapsed().as_micros() as u64,
                "profiler section"
            );
        }
    }
}
