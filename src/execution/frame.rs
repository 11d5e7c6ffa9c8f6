//! Call-stack frames
//!
//! A frame is one level of nested execution. Every queued entry carries the
//! frame it belongs to; the frame's control token lets holders discard the
//! frame's remaining work without holding a reference to the context.

use crate::source::CommandResultCallback;

/// Depth-scoped cancel token.
///
/// Only [`ExecutionContext`](super::ExecutionContext) hands these out, and
/// only a [`FrameControlTarget`] can act on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    /// Drop all pending work. Used by the top frame of a fresh run.
    ClearQueue,
    /// Drop pending work at this depth or deeper.
    DiscardFrom(usize),
}

/// Something that owns a work queue a [`FrameControl`] can be applied to.
pub trait FrameControlTarget {
    fn discard_at_depth_or_higher(&mut self, depth: usize);

    fn clear_queue(&mut self);
}

impl FrameControl {
    pub fn discard<C: FrameControlTarget + ?Sized>(self, target: &mut C) {
        match self {
            FrameControl::ClearQueue => target.clear_queue(),
            FrameControl::DiscardFrom(depth) => target.discard_at_depth_or_higher(depth),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    depth: usize,
    return_value_consumer: CommandResultCallback,
    frame_control: FrameControl,
}

impl Frame {
    pub fn new(
        depth: usize,
        return_value_consumer: CommandResultCallback,
        frame_control: FrameControl,
    ) -> Self {
        Self {
            depth,
            return_value_consumer,
            frame_control,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn return_value_consumer(&self) -> &CommandResultCallback {
        &self.return_value_consumer
    }

    pub fn frame_control(&self) -> FrameControl {
        self.frame_control
    }

    /// Drop everything still queued for this frame and its descendants.
    pub fn discard<C: FrameControlTarget + ?Sized>(&self, target: &mut C) {
        self.frame_control.discard(target);
    }

    pub fn return_success<C: FrameControlTarget + ?Sized>(&self, target: &mut C, value: i32) {
        self.return_value_consumer.on_success(value);
        self.discard(target);
    }

    pub fn return_failure<C: FrameControlTarget + ?Sized>(&self, target: &mut C) {
        self.return_value_consumer.on_failure();
        self.discard(target);
    }
}
