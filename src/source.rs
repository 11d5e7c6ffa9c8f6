//! Command source contract
//!
//! The capability set a command source must offer so the scheduler can drive
//! it, plus the result callback used to report outcomes back to whoever
//! queued the work.

use crate::dispatch::CommandDispatcher;
use crate::error::CommandSyntaxError;
use crate::execution::TraceCallbacks;
use std::fmt;
use std::rc::Rc;

/// Sink for `(success, result)` pairs.
///
/// The empty callback is a distinguished value: chaining with it is free and
/// returns the other side unchanged. Equality is identity of the underlying
/// closure.
#[derive(Clone, Default)]
pub struct CommandResultCallback {
    inner: Option<Rc<dyn Fn(bool, i32)>>,
}

impl CommandResultCallback {
    /// The no-op callback.
    pub const EMPTY: CommandResultCallback = CommandResultCallback { inner: None };

    pub fn new<F>(f: F) -> Self
    where
        F: Fn(bool, i32) + 'static,
    {
        Self {
            inner: Some(Rc::new(f)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub fn on_result(&self, success: bool, result: i32) {
        if let Some(f) = &self.inner {
            f(success, result);
        }
    }

    pub fn on_success(&self, result: i32) {
        self.on_result(true, result);
    }

    pub fn on_failure(&self) {
        self.on_result(false, 0);
    }

    /// Combine two callbacks; `first` runs before `second`.
    pub fn chain(first: CommandResultCallback, second: CommandResultCallback) -> Self {
        match (&first.inner, &second.inner) {
            (None, _) => second,
            (_, None) => first,
            (Some(a), Some(b)) => {
                let a = Rc::clone(a);
                let b = Rc::clone(b);
                Self::new(move |success, result| {
                    a(success, result);
                    b(success, result);
                })
            }
        }
    }
}

impl PartialEq for CommandResultCallback {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for CommandResultCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("CommandResultCallback::EMPTY")
        } else {
            f.write_str("CommandResultCallback(..)")
        }
    }
}

/// Capabilities the scheduler needs from a command source.
///
/// Sources are cheap to clone; redirects produce new sources and every queued
/// command owns its own copy.
pub trait ExecutionCommandSource: Clone + 'static {
    fn has_permission(&self, level: u8) -> bool;

    /// Return a copy of this source reporting results to `callback`.
    fn with_callback(&self, callback: CommandResultCallback) -> Self;

    fn callback(&self) -> CommandResultCallback;

    fn dispatcher(&self) -> &CommandDispatcher<Self>;

    /// Surface a command error. `forked` is set when the failure happened in
    /// one branch of a fan-out, where sources usually stay quiet.
    fn handle_error(
        &self,
        error: &CommandSyntaxError,
        forked: bool,
        tracer: Option<&mut dyn TraceCallbacks>,
    );

    fn is_silent(&self) -> bool;
}
