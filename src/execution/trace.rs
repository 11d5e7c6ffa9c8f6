//! Trace callbacks
//!
//! Optional diagnostic sink a caller can install on a context to observe
//! command entry, return, function calls and errors.

use serde::Serialize;
use std::io::Write;
use tracing::{debug, warn};

/// Receives scheduler events. Closed exactly once by the owning context.
pub trait TraceCallbacks {
    fn on_command(&mut self, depth: usize, command: &str);

    fn on_return(&mut self, depth: usize, command: &str, result: i32);

    fn on_error(&mut self, message: &str);

    fn on_call(&mut self, depth: usize, function: &str, command_count: usize);

    fn close(&mut self) {}
}

/// Forwards trace events to `tracing` at debug level.
#[derive(Debug, Default)]
pub struct LogTraceCallbacks;

impl TraceCallbacks for LogTraceCallbacks {
    fn on_command(&mut self, depth: usize, command: &str) {
        debug!(depth, command, "command");
    }

    fn on_return(&mut self, depth: usize, command: &str, result: i32) {
        debug!(depth, command, result, "return");
    }

    fn on_error(&mut self, message: &str) {
        debug!(message, "command error");
    }

    fn on_call(&mut self, depth: usize, function: &str, command_count: usize) {
        debug!(depth, function, command_count, "call");
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum TraceEvent<'a> {
    Command {
        depth: usize,
        command: &'a str,
    },
    Return {
        depth: usize,
        command: &'a str,
        result: i32,
    },
    Error {
        message: &'a str,
    },
    Call {
        depth: usize,
        function: &'a str,
        command_count: usize,
    },
}

/// Writes one JSON object per event, newline separated.
///
/// Write failures are logged and otherwise ignored; tracing never changes the
/// outcome of a run.
pub struct JsonTraceCallbacks<W: Write> {
    writer: W,
}

impl<W: Write> JsonTraceCallbacks<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, event: TraceEvent<'_>) {
        let result = serde_json::to_writer(&mut self.writer, &event)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            warn!(error = %e, "Failed to write trace event");
        }
    }
}

impl<W: Write> TraceCallbacks for JsonTraceCallbacks<W> {
    fn on_command(&mut self, depth: usize, command: &str) {
        self.write(TraceEvent::Command { depth, command });
    }

    fn on_return(&mut self, depth: usize, command: &str, result: i32) {
        self.write(TraceEvent::Return {
            depth,
            command,
            result,
        });
    }

    fn on_error(&mut self, message: &str) {
        self.write(TraceEvent::Error { message });
    }

    fn on_call(&mut self, depth: usize, function: &str, command_count: usize) {
        self.write(TraceEvent::Call {
            depth,
            function,
            command_count,
        });
    }

    fn close(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "Failed to flush trace output");
        }
    }
}
