//! Lazy scheduling of step lists.
//!
//! Queues one item per execution followed by itself, so each item's own
//! descendants finish before the next item starts and a long list never
//! occupies more than two queue slots.

use crate::execution::context::ExecutionContext;
use crate::execution::entry::{CommandQueueEntry, EntryAction, UnboundEntryAction};
use crate::execution::frame::Frame;
use crate::source::ExecutionCommandSource;
use std::rc::Rc;

/// What a [`ContinuationTask`] walks over.
pub enum ContinuationItems<S> {
    /// Several actions run for one source (a function body).
    Actions {
        source: S,
        actions: Rc<[UnboundEntryAction<S>]>,
    },
    /// One action run for several sources (a fanned-out command).
    Sources {
        action: UnboundEntryAction<S>,
        sources: Rc<[S]>,
    },
}

impl<S: ExecutionCommandSource> ContinuationItems<S> {
    fn len(&self) -> usize {
        match self {
            ContinuationItems::Actions { actions, .. } => actions.len(),
            ContinuationItems::Sources { sources, .. } => sources.len(),
        }
    }

    fn bind(&self, index: usize) -> EntryAction<S> {
        match self {
            ContinuationItems::Actions { source, actions } => {
                actions[index].clone().bind(source.clone())
            }
            ContinuationItems::Sources { action, sources } => {
                action.clone().bind(sources[index].clone())
            }
        }
    }
}

pub struct ContinuationTask<S> {
    items: ContinuationItems<S>,
    index: usize,
}

impl<S: ExecutionCommandSource> ContinuationTask<S> {
    pub fn schedule(context: &mut ExecutionContext<S>, frame: Frame, items: ContinuationItems<S>) {
        match items.len() {
            0 => {}
            1 => context.queue_next(CommandQueueEntry::new(frame, items.bind(0))),
            2 => {
                context.queue_next(CommandQueueEntry::new(frame.clone(), items.bind(0)));
                context.queue_next(CommandQueueEntry::new(frame, items.bind(1)));
            }
            _ => context.queue_next(CommandQueueEntry::new(
                frame,
                EntryAction::Continue(ContinuationTask { items, index: 0 }),
            )),
        }
    }

    pub(crate) fn execute(self, context: &mut ExecutionContext<S>, frame: &Frame) {
        let ContinuationTask { items, index } = self;
        context.queue_next(CommandQueueEntry::new(frame.clone(), items.bind(index)));
        let next = index + 1;
        if next < items.len() {
            context.queue_next(CommandQueueEntry::new(
                frame.clone(),
                EntryAction::Continue(ContinuationTask { items, index: next }),
            ));
        }
    }
}
