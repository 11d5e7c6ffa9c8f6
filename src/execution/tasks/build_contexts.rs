//! Chain resolution
//!
//! Walks a [`ContextChain`] from its top stage to its execute stage, applying
//! redirects to the current set of sources, then schedules the command once
//! per surviving source.

use super::continuation::{ContinuationItems, ContinuationTask};
use super::execute_command::ExecuteCommand;
use crate::chain::{ChainModifiers, ChainStage, Command, ContextChain, RedirectModifier};
use crate::error::CommandSyntaxError;
use crate::execution::context::ExecutionContext;
use crate::execution::control::ExecutionControl;
use crate::execution::entry::{CommandQueueEntry, EntryAction, UnboundEntryAction};
use crate::execution::frame::Frame;
use crate::source::{CommandResultCallback, ExecutionCommandSource};
use std::rc::Rc;

pub struct BuildContexts<S> {
    command_input: Rc<str>,
    chain: ContextChain<S>,
}

impl<S> Clone for BuildContexts<S> {
    fn clone(&self) -> Self {
        Self {
            command_input: Rc::clone(&self.command_input),
            chain: self.chain.clone(),
        }
    }
}

/// Sources left once every modify stage has been applied.
struct Resolved<S> {
    chain: ContextChain<S>,
    sources: Vec<S>,
    modifiers: ChainModifiers,
}

impl<S> BuildContexts<S> {
    pub fn new(command_input: impl Into<String>, chain: ContextChain<S>) -> Self {
        Self {
            command_input: Rc::from(command_input.into()),
            chain,
        }
    }

    pub fn command_input(&self) -> &str {
        &self.command_input
    }

    pub fn chain(&self) -> &ContextChain<S> {
        &self.chain
    }

    /// Bind to the source a caller seeded the context with.
    pub fn top_level(self, source: S) -> TopLevelCommand<S> {
        TopLevelCommand {
            build: self,
            source,
        }
    }

    /// Resume with explicit sources, e.g. after a custom modifier.
    pub fn continuation(
        self,
        original_source: S,
        sources: Vec<S>,
        modifiers: ChainModifiers,
    ) -> BuildContinuation<S> {
        BuildContinuation {
            build: self,
            original_source,
            sources,
            modifiers,
        }
    }
}

impl<S: ExecutionCommandSource> BuildContexts<S> {
    fn trace_command_start(&self, context: &mut ExecutionContext<S>, frame: &Frame) {
        if let Some(tracer) = context.tracer() {
            tracer.on_command(frame.depth(), &self.command_input);
        }
    }

    /// Run as one line of a function body.
    pub(crate) fn execute_unbound(
        &self,
        source: &S,
        context: &mut ExecutionContext<S>,
        frame: &Frame,
    ) {
        self.trace_command_start(context, frame);
        self.execute(
            source,
            vec![source.clone()],
            context,
            frame,
            ChainModifiers::DEFAULT,
        );
    }

    fn execute(
        &self,
        original_source: &S,
        initial_sources: Vec<S>,
        context: &mut ExecutionContext<S>,
        frame: &Frame,
        initial_modifiers: ChainModifiers,
    ) {
        let resolved = if self.chain.stage() == ChainStage::Execute {
            Some(Resolved {
                chain: self.chain.clone(),
                sources: initial_sources,
                modifiers: initial_modifiers,
            })
        } else {
            context
                .profiler()
                .push(&format!("prepare {}", self.command_input));
            let resolved = self.resolve(
                original_source,
                initial_sources,
                context,
                frame,
                initial_modifiers,
            );
            context.profiler().pop();
            resolved
        };

        if let Some(resolved) = resolved {
            self.schedule(resolved, context, frame);
        }
    }

    /// Apply every modify stage. `None` means the chain was handed off to a
    /// custom modifier or stopped on an error.
    fn resolve(
        &self,
        original_source: &S,
        initial_sources: Vec<S>,
        context: &mut ExecutionContext<S>,
        frame: &Frame,
        initial_modifiers: ChainModifiers,
    ) -> Option<Resolved<S>> {
        let fork_limit = context.fork_limit();
        let mut chain = self.chain.clone();
        let mut sources = initial_sources;
        let mut modifiers = initial_modifiers;

        while chain.stage() == ChainStage::Modify {
            if chain.top().forks() {
                modifiers = modifiers.set_forked();
            }
            match chain.top().modifier().cloned() {
                Some(RedirectModifier::Custom(custom)) => {
                    let mut control = ExecutionControl::new(context, frame.clone());
                    custom.apply(original_source, &sources, &chain, modifiers, &mut control);
                    return None;
                }
                Some(RedirectModifier::Simple(modifier)) => {
                    context.increment_cost();
                    let forked = modifiers.is_forked();
                    let mut next = Vec::new();
                    for source in &sources {
                        match chain.run_modifier(&*modifier, source, forked) {
                            Ok(results) => {
                                if next.len() + results.len() > fork_limit {
                                    original_source.handle_error(
                                        &CommandSyntaxError::ForkLimitReached(fork_limit),
                                        forked,
                                        context.tracer(),
                                    );
                                    return None;
                                }
                                next.extend(results);
                            }
                            Err(err) => {
                                source.handle_error(&err, forked, context.tracer());
                                if !forked {
                                    return None;
                                }
                            }
                        }
                    }
                    sources = next;
                }
                None => {}
            }
            chain = chain.next_stage()?;
        }

        Some(Resolved {
            chain,
            sources,
            modifiers,
        })
    }

    fn schedule(&self, resolved: Resolved<S>, context: &mut ExecutionContext<S>, frame: &Frame) {
        let Resolved {
            chain,
            mut sources,
            modifiers,
        } = resolved;

        if sources.is_empty() {
            if modifiers.is_return() {
                context.queue_next(CommandQueueEntry::new(frame.clone(), EntryAction::Fallthrough));
            }
            return;
        }

        let command = chain.top().command().cloned();
        match command {
            Some(Command::Custom(custom)) => {
                let mut control = ExecutionControl::new(context, frame.clone());
                for source in &sources {
                    custom.run(source, &chain, modifiers, &mut control);
                }
            }
            Some(Command::Simple(_)) => {
                if modifiers.is_return() {
                    let first = sources.swap_remove(0);
                    let callback = CommandResultCallback::chain(
                        first.callback(),
                        frame.return_value_consumer().clone(),
                    );
                    sources = vec![first.with_callback(callback)];
                }
                let action = UnboundEntryAction::Execute(ExecuteCommand::new(
                    Rc::clone(&self.command_input),
                    modifiers,
                    chain,
                ));
                ContinuationTask::schedule(
                    context,
                    frame.clone(),
                    ContinuationItems::Sources {
                        action,
                        sources: Rc::from(sources),
                    },
                );
            }
            None => {}
        }
    }
}

/// A command seeded directly into a context, with the source it runs for.
pub struct TopLevelCommand<S> {
    build: BuildContexts<S>,
    source: S,
}

impl<S: ExecutionCommandSource> TopLevelCommand<S> {
    pub(crate) fn execute(self, context: &mut ExecutionContext<S>, frame: &Frame) {
        self.build.trace_command_start(context, frame);
        let sources = vec![self.source.clone()];
        self.build.execute(
            &self.source,
            sources,
            context,
            frame,
            ChainModifiers::DEFAULT,
        );
    }
}

/// Resumes chain resolution with sources produced elsewhere.
pub struct BuildContinuation<S> {
    build: BuildContexts<S>,
    original_source: S,
    sources: Vec<S>,
    modifiers: ChainModifiers,
}

impl<S: ExecutionCommandSource> BuildContinuation<S> {
    pub(crate) fn execute(self, context: &mut ExecutionContext<S>, frame: &Frame) {
        self.build.execute(
            &self.original_source,
            self.sources,
            context,
            frame,
            self.modifiers,
        );
    }
}
