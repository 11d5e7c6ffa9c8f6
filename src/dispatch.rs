//! Command Dispatcher
//!
//! A small registry mapping the first word of a command line to a chain
//! builder. Builders receive the dispatcher so they can parse nested commands
//! (`execute ... run <command>`).

use crate::chain::ContextChain;
use crate::error::CommandSyntaxError;
use crate::source::ExecutionCommandSource;
use std::collections::BTreeMap;

pub type ChainBuilder<S> =
    dyn Fn(&CommandDispatcher<S>, &str, &str, &S) -> Result<ContextChain<S>, CommandSyntaxError>;

struct RegisteredCommand<S> {
    permission: u8,
    builder: Box<ChainBuilder<S>>,
}

pub struct CommandDispatcher<S> {
    commands: BTreeMap<String, RegisteredCommand<S>>,
}

impl<S> Default for CommandDispatcher<S> {
    fn default() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }
}

impl<S> CommandDispatcher<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`. The builder is called with the dispatcher, the full
    /// command line, the text after the name, and the parsing source.
    pub fn register<F>(&mut self, name: &str, permission: u8, builder: F)
    where
        F: Fn(&CommandDispatcher<S>, &str, &str, &S) -> Result<ContextChain<S>, CommandSyntaxError>
            + 'static,
    {
        self.commands.insert(
            name.to_string(),
            RegisteredCommand {
                permission,
                builder: Box::new(builder),
            },
        );
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }
}

impl<S: ExecutionCommandSource> CommandDispatcher<S> {
    pub fn parse(&self, input: &str, source: &S) -> Result<ContextChain<S>, CommandSyntaxError> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);
        let (name, rest) = match input.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (input, ""),
        };
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| CommandSyntaxError::UnknownCommand(name.to_string()))?;
        if !source.has_permission(command.permission) {
            return Err(CommandSyntaxError::Permission(command.permission));
        }
        (command.builder)(self, input, rest, source)
    }
}
