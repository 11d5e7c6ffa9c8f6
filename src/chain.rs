//! Parsed command chains
//!
//! A [`ContextChain`] is what a parser hands to the scheduler: zero or more
//! modify stages (redirects, forks, custom modifiers) followed by exactly one
//! execute stage.

use crate::error::CommandSyntaxError;
use crate::execution::{CustomCommandExecutor, CustomModifierExecutor};
use crate::source::ExecutionCommandSource;
use std::fmt;
use std::rc::Rc;

pub type CommandFn<S> = dyn Fn(&CommandContext<'_, S>) -> Result<i32, CommandSyntaxError>;
pub type ModifierFn<S> = dyn Fn(&CommandContext<'_, S>) -> Result<Vec<S>, CommandSyntaxError>;

/// Flags carried along a chain while it is being resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainModifiers {
    forked: bool,
    is_return: bool,
}

impl ChainModifiers {
    pub const DEFAULT: ChainModifiers = ChainModifiers {
        forked: false,
        is_return: false,
    };

    pub fn is_forked(self) -> bool {
        self.forked
    }

    pub fn is_return(self) -> bool {
        self.is_return
    }

    pub fn set_forked(self) -> Self {
        Self {
            forked: true,
            ..self
        }
    }

    pub fn set_return(self) -> Self {
        Self {
            is_return: true,
            ..self
        }
    }
}

/// Body of an execute stage.
pub enum Command<S> {
    /// Runs synchronously and returns its result.
    Simple(Rc<CommandFn<S>>),
    /// Hooks into the scheduler to queue follow-up work.
    Custom(Rc<dyn CustomCommandExecutor<S>>),
}

impl<S> Command<S> {
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<'_, S>) -> Result<i32, CommandSyntaxError> + 'static,
    {
        Command::Simple(Rc::new(f))
    }

    pub fn custom<E>(executor: E) -> Self
    where
        E: CustomCommandExecutor<S> + 'static,
    {
        Command::Custom(Rc::new(executor))
    }
}

impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        match self {
            Command::Simple(f) => Command::Simple(Rc::clone(f)),
            Command::Custom(e) => Command::Custom(Rc::clone(e)),
        }
    }
}

/// Source transformation applied by a modify stage.
pub enum RedirectModifier<S> {
    /// Maps one source to zero or more sources.
    Simple(Rc<ModifierFn<S>>),
    /// Takes over the rest of the chain.
    Custom(Rc<dyn CustomModifierExecutor<S>>),
}

impl<S> RedirectModifier<S> {
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&CommandContext<'_, S>) -> Result<Vec<S>, CommandSyntaxError> + 'static,
    {
        RedirectModifier::Simple(Rc::new(f))
    }

    pub fn custom<E>(executor: E) -> Self
    where
        E: CustomModifierExecutor<S> + 'static,
    {
        RedirectModifier::Custom(Rc::new(executor))
    }
}

impl<S> Clone for RedirectModifier<S> {
    fn clone(&self) -> Self {
        match self {
            RedirectModifier::Simple(f) => RedirectModifier::Simple(Rc::clone(f)),
            RedirectModifier::Custom(e) => RedirectModifier::Custom(Rc::clone(e)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStage {
    Modify,
    Execute,
}

enum StageKind<S> {
    Modify {
        modifier: Option<RedirectModifier<S>>,
        forks: bool,
    },
    Execute(Command<S>),
}

impl<S> Clone for StageKind<S> {
    fn clone(&self) -> Self {
        match self {
            StageKind::Modify { modifier, forks } => StageKind::Modify {
                modifier: modifier.clone(),
                forks: *forks,
            },
            StageKind::Execute(command) => StageKind::Execute(command.clone()),
        }
    }
}

/// One parsed node of a chain: its input text, its arguments, and what it does.
pub struct Stage<S> {
    input: String,
    arguments: Vec<String>,
    kind: StageKind<S>,
}

impl<S> Clone for Stage<S> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            arguments: self.arguments.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl<S> Stage<S> {
    pub fn modify(
        input: impl Into<String>,
        arguments: Vec<String>,
        modifier: Option<RedirectModifier<S>>,
        forks: bool,
    ) -> Self {
        Self {
            input: input.into(),
            arguments,
            kind: StageKind::Modify { modifier, forks },
        }
    }

    pub fn execute(input: impl Into<String>, arguments: Vec<String>, command: Command<S>) -> Self {
        Self {
            input: input.into(),
            arguments,
            kind: StageKind::Execute(command),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn stage(&self) -> ChainStage {
        match self.kind {
            StageKind::Modify { .. } => ChainStage::Modify,
            StageKind::Execute(_) => ChainStage::Execute,
        }
    }

    pub fn forks(&self) -> bool {
        matches!(self.kind, StageKind::Modify { forks: true, .. })
    }

    pub fn modifier(&self) -> Option<&RedirectModifier<S>> {
        match &self.kind {
            StageKind::Modify { modifier, .. } => modifier.as_ref(),
            StageKind::Execute(_) => None,
        }
    }

    pub fn command(&self) -> Option<&Command<S>> {
        match &self.kind {
            StageKind::Execute(command) => Some(command),
            StageKind::Modify { .. } => None,
        }
    }
}

/// Arguments and source handed to a simple command or modifier.
pub struct CommandContext<'a, S> {
    source: &'a S,
    stage: &'a Stage<S>,
}

impl<'a, S> CommandContext<'a, S> {
    pub fn new(source: &'a S, stage: &'a Stage<S>) -> Self {
        Self { source, stage }
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn input(&self) -> &'a str {
        &self.stage.input
    }

    pub fn argument(&self, index: usize) -> Result<&'a str, CommandSyntaxError> {
        self.stage
            .arguments
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                CommandSyntaxError::InvalidArgument(format!(
                    "missing argument {} in '{}'",
                    index, self.stage.input
                ))
            })
    }

    pub fn integer_argument(&self, index: usize) -> Result<i32, CommandSyntaxError> {
        let raw = self.argument(index)?;
        raw.parse::<i32>().map_err(|_| {
            CommandSyntaxError::InvalidArgument(format!("expected integer, got '{}'", raw))
        })
    }
}

/// Immutable, cheaply clonable view over the remaining stages of a command.
pub struct ContextChain<S> {
    stages: Rc<[Stage<S>]>,
    offset: usize,
}

impl<S> Clone for ContextChain<S> {
    fn clone(&self) -> Self {
        Self {
            stages: Rc::clone(&self.stages),
            offset: self.offset,
        }
    }
}

impl<S> fmt::Debug for ContextChain<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextChain")
            .field("input", &self.input())
            .field("remaining_stages", &(self.stages.len() - self.offset))
            .finish()
    }
}

impl<S> ContextChain<S> {
    /// A chain with a single execute stage.
    pub fn of(execute: Stage<S>) -> Self {
        debug_assert_eq!(execute.stage(), ChainStage::Execute);
        Self {
            stages: Rc::from(vec![execute]),
            offset: 0,
        }
    }

    /// Return a new chain with `stage` placed in front of the current top.
    pub fn prepend(&self, stage: Stage<S>) -> Self {
        debug_assert_eq!(stage.stage(), ChainStage::Modify);
        let mut stages = Vec::with_capacity(self.stages.len() - self.offset + 1);
        stages.push(stage);
        stages.extend(self.stages[self.offset..].iter().cloned());
        Self {
            stages: Rc::from(stages),
            offset: 0,
        }
    }

    pub fn top(&self) -> &Stage<S> {
        &self.stages[self.offset]
    }

    pub fn stage(&self) -> ChainStage {
        self.top().stage()
    }

    pub fn input(&self) -> &str {
        self.top().input()
    }

    pub fn next_stage(&self) -> Option<Self> {
        if self.offset + 1 < self.stages.len() {
            Some(Self {
                stages: Rc::clone(&self.stages),
                offset: self.offset + 1,
            })
        } else {
            None
        }
    }
}

impl<S: ExecutionCommandSource> ContextChain<S> {
    /// Apply the top stage's simple modifier to `source`.
    ///
    /// A stage without a modifier passes the source through unchanged. In
    /// forked mode a failing modifier yields no sources instead of an error.
    pub fn run_modifier(
        &self,
        modifier: &ModifierFn<S>,
        source: &S,
        forked: bool,
    ) -> Result<Vec<S>, CommandSyntaxError> {
        let context = CommandContext::new(source, self.top());
        match modifier(&context) {
            Ok(sources) => Ok(sources),
            Err(_) if forked => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Run the top stage's simple command for `source`, reporting the outcome
    /// to `source.callback()`.
    ///
    /// Forked runs report `1` on success and swallow failures as `0`.
    pub fn run_executable(&self, source: &S, forked: bool) -> Result<i32, CommandSyntaxError> {
        let stage = self.top();
        let command = match stage.command() {
            Some(Command::Simple(f)) => Rc::clone(f),
            _ => {
                return Err(CommandSyntaxError::InvalidArgument(format!(
                    "'{}' is not a directly executable command",
                    stage.input()
                )))
            }
        };
        let context = CommandContext::new(source, stage);
        match command(&context) {
            Ok(result) => {
                source.callback().on_success(result);
                Ok(if forked { 1 } else { result })
            }
            Err(err) => {
                source.callback().on_failure();
                if forked {
                    Ok(0)
                } else {
                    Err(err)
                }
            }
        }
    }
}
