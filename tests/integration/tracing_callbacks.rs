//! Tracer hooks and tracer lifecycle.

use super::test_utils::{context, run_function, source_with};
use cmdexec::execution::{JsonTraceCallbacks, TraceCallbacks};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct Recording {
    events: Rc<RefCell<Vec<String>>>,
    closed: Rc<Cell<usize>>,
}

impl TraceCallbacks for Recording {
    fn on_command(&mut self, depth: usize, command: &str) {
        self.events
            .borrow_mut()
            .push(format!("command {} {}", depth, command));
    }

    fn on_return(&mut self, depth: usize, command: &str, result: i32) {
        self.events
            .borrow_mut()
            .push(format!("return {} {} = {}", depth, command, result));
    }

    fn on_error(&mut self, message: &str) {
        self.events.borrow_mut().push(format!("error {}", message));
    }

    fn on_call(&mut self, depth: usize, function: &str, command_count: usize) {
        self.events
            .borrow_mut()
            .push(format!("call {} {} ({})", depth, function, command_count));
    }

    fn close(&mut self) {
        self.closed.set(self.closed.get() + 1);
    }
}

#[test]
fn test_tracer_sees_calls_commands_and_returns() {
    let source = source_with(&[("t:f", "say hi\nreturn 2")]);
    let tracer = Recording::default();
    let events = Rc::clone(&tracer.events);
    let mut ctx = context(100);
    ctx.set_tracer(Box::new(tracer));

    run_function(&mut ctx, &source, "t:f");

    assert_eq!(
        *events.borrow(),
        vec![
            "call 0 t:f (2)",
            "command 1 say hi",
            "return 1 say hi = 1",
            "command 1 return 2",
        ]
    );
}

#[test]
fn test_tracer_records_errors() {
    let source = source_with(&[("t:f", "fail broken")]);
    let tracer = Recording::default();
    let events = Rc::clone(&tracer.events);
    let mut ctx = context(100);
    ctx.set_tracer(Box::new(tracer));

    run_function(&mut ctx, &source, "t:f");

    assert_eq!(events.borrow().last().unwrap(), "error broken");
}

#[test]
fn test_tracer_closed_exactly_once() {
    let tracer = Recording::default();
    let closed = Rc::clone(&tracer.closed);
    let mut ctx = context(10);
    ctx.set_tracer(Box::new(tracer));
    assert!(ctx.has_tracer());

    ctx.close();
    ctx.close();
    assert!(!ctx.has_tracer());
    drop(ctx);
    assert_eq!(closed.get(), 1);
}

#[test]
fn test_tracer_closed_on_drop() {
    let tracer = Recording::default();
    let closed = Rc::clone(&tracer.closed);
    {
        let mut ctx = context(10);
        ctx.set_tracer(Box::new(tracer));
    }
    assert_eq!(closed.get(), 1);
}

#[test]
fn test_replaced_tracer_is_returned_open() {
    let first = Recording::default();
    let first_closed = Rc::clone(&first.closed);
    let mut ctx = context(10);
    assert!(ctx.set_tracer(Box::new(first)).is_none());

    let previous = ctx.set_tracer(Box::new(Recording::default()));
    assert!(previous.is_some());
    assert_eq!(first_closed.get(), 0);
}

#[test]
fn test_json_tracer_writes_one_line_per_event() {
    let mut json = JsonTraceCallbacks::new(Vec::new());
    json.on_call(0, "t:f", 1);
    let lines = String::from_utf8(json.into_inner()).unwrap();
    assert_eq!(lines.lines().count(), 1);
    assert!(lines.contains("\"event\":\"call\""));
}
