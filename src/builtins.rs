//! Built-in commands
//!
//! A concrete command source and a handful of commands that exercise every
//! path of the scheduler: plain commands, forking redirects, returns, function
//! calls and isolated calls.

use crate::chain::{
    ChainModifiers, Command, CommandContext, ContextChain, RedirectModifier, Stage,
};
use crate::dispatch::CommandDispatcher;
use crate::error::{CommandSyntaxError, ExecError};
use crate::execution::tasks::{BuildContexts, CallFunction, IsolatedCall};
use crate::execution::{
    CustomCommandExecutor, CustomModifierExecutor, EntryAction, ExecutionControl,
    TraceCallbacks, UnboundEntryAction, WithErrorHandling,
};
use crate::function::{FunctionLibrary, InstantiatedFunction};
use crate::source::{CommandResultCallback, ExecutionCommandSource};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub const DEFAULT_PERMISSION: u8 = 2;

/// Source used by the CLI and tests. Output lines are collected in a buffer
/// shared by every source derived from the same root.
#[derive(Clone)]
pub struct ScriptSource {
    name: Rc<str>,
    permission: u8,
    silent: bool,
    callback: CommandResultCallback,
    output: Rc<RefCell<Vec<String>>>,
    dispatcher: Rc<CommandDispatcher<ScriptSource>>,
    functions: Rc<RefCell<FunctionLibrary<ScriptSource>>>,
}

impl std::fmt::Debug for ScriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptSource")
            .field("name", &self.name)
            .field("permission", &self.permission)
            .field("silent", &self.silent)
            .finish()
    }
}

impl ScriptSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            permission: DEFAULT_PERMISSION,
            silent: false,
            callback: CommandResultCallback::EMPTY,
            output: Rc::new(RefCell::new(Vec::new())),
            dispatcher: Rc::new(builtin_dispatcher()),
            functions: Rc::new(RefCell::new(FunctionLibrary::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same source acting as someone else.
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: Rc::from(name),
            ..self.clone()
        }
    }

    pub fn with_permission(&self, permission: u8) -> Self {
        Self {
            permission,
            ..self.clone()
        }
    }

    pub fn with_silent(&self, silent: bool) -> Self {
        Self {
            silent,
            ..self.clone()
        }
    }

    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn clear_output(&self) {
        self.output.borrow_mut().clear();
    }

    pub fn function(&self, id: &str) -> Option<Rc<InstantiatedFunction<ScriptSource>>> {
        self.functions.borrow().get(id)
    }

    pub fn function_ids(&self) -> Vec<String> {
        self.functions.borrow().ids().map(str::to_string).collect()
    }

    /// Compile a function from text and register it.
    pub fn define_function(&self, id: &str, text: &str) -> Result<(), ExecError> {
        let function = InstantiatedFunction::compile(id, text, Path::new(id), self)?;
        self.functions.borrow_mut().insert(function);
        Ok(())
    }

    pub fn load_functions(&self, dir: &Path, namespace: &str) -> Result<usize, ExecError> {
        self.functions.borrow_mut().load_dir(dir, namespace, self)
    }

    fn emit(&self, line: String) {
        if !self.silent {
            self.output.borrow_mut().push(line);
        }
    }
}

impl ExecutionCommandSource for ScriptSource {
    fn has_permission(&self, level: u8) -> bool {
        self.permission >= level
    }

    fn with_callback(&self, callback: CommandResultCallback) -> Self {
        Self {
            callback,
            ..self.clone()
        }
    }

    fn callback(&self) -> CommandResultCallback {
        self.callback.clone()
    }

    fn dispatcher(&self) -> &CommandDispatcher<Self> {
        &self.dispatcher
    }

    fn handle_error(
        &self,
        error: &CommandSyntaxError,
        forked: bool,
        tracer: Option<&mut dyn TraceCallbacks>,
    ) {
        let message = error.to_string();
        if let Some(tracer) = tracer {
            tracer.on_error(&message);
        }
        if !forked {
            self.emit(format!("[{}] error: {}", self.name, message));
        }
    }

    fn is_silent(&self) -> bool {
        self.silent
    }
}

/// Dispatcher with every built-in command registered.
pub fn builtin_dispatcher() -> CommandDispatcher<ScriptSource> {
    let mut dispatcher: CommandDispatcher<ScriptSource> = CommandDispatcher::new();

    dispatcher.register("say", 0, |_, input, rest, _| {
        if rest.is_empty() {
            return Err(CommandSyntaxError::InvalidArgument(
                "say requires a message".to_string(),
            ));
        }
        Ok(ContextChain::of(Stage::execute(
            input,
            vec![rest.to_string()],
            Command::simple(|ctx: &CommandContext<'_, ScriptSource>| {
                let source = ctx.source();
                source.emit(format!("[{}] {}", source.name(), ctx.argument(0)?));
                Ok(1)
            }),
        )))
    });

    dispatcher.register("fail", 0, |_, input, rest, _| {
        Ok(ContextChain::of(Stage::execute(
            input,
            vec![rest.to_string()],
            Command::simple(|ctx: &CommandContext<'_, ScriptSource>| {
                let message = ctx.argument(0).unwrap_or_default();
                Err(CommandSyntaxError::Failed(if message.is_empty() {
                    "command failed".to_string()
                } else {
                    message.to_string()
                }))
            }),
        )))
    });

    dispatcher.register("return", DEFAULT_PERMISSION, |dispatcher, input, rest, source| {
        if let Some(command) = strip_keyword(rest, "run") {
            let inner = dispatcher.parse(command, source)?;
            return Ok(inner.prepend(Stage::modify(
                input,
                Vec::new(),
                Some(RedirectModifier::custom(ReturnRun)),
                false,
            )));
        }
        if rest == "fail" {
            return Ok(ContextChain::of(Stage::execute(
                input,
                Vec::new(),
                Command::custom(ReturnFail),
            )));
        }
        rest.parse::<i32>().map_err(|_| {
            CommandSyntaxError::InvalidArgument(format!("expected integer, got '{}'", rest))
        })?;
        Ok(ContextChain::of(Stage::execute(
            input,
            vec![rest.to_string()],
            Command::custom(ReturnValue),
        )))
    });

    dispatcher.register("function", DEFAULT_PERMISSION, |_, input, rest, _| {
        if rest.is_empty() || rest.contains(char::is_whitespace) {
            return Err(CommandSyntaxError::InvalidArgument(format!(
                "expected a single function id, got '{}'",
                rest
            )));
        }
        Ok(ContextChain::of(Stage::execute(
            input,
            vec![rest.to_string()],
            Command::custom(RunFunction),
        )))
    });

    dispatcher.register("execute", DEFAULT_PERMISSION, |dispatcher, input, rest, source| {
        parse_execute(dispatcher, input, rest, source)
    });

    dispatcher
}

/// `rest` without its leading `keyword`, if it starts with one.
fn strip_keyword<'a>(rest: &'a str, keyword: &str) -> Option<&'a str> {
    let tail = rest.strip_prefix(keyword)?;
    if tail.is_empty() {
        Some(tail)
    } else if tail.starts_with(char::is_whitespace) {
        Some(tail.trim_start())
    } else {
        None
    }
}

fn split_word(rest: &str) -> (&str, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((word, tail)) => (word, tail.trim_start()),
        None => (rest, ""),
    }
}

/// `execute (as <names> | if function <id>)* run <command>`
fn parse_execute(
    dispatcher: &CommandDispatcher<ScriptSource>,
    input: &str,
    rest: &str,
    source: &ScriptSource,
) -> Result<ContextChain<ScriptSource>, CommandSyntaxError> {
    let (keyword, tail) = split_word(rest);
    match keyword {
        "run" => dispatcher.parse(tail, source),
        "as" => {
            let (names, tail) = split_word(tail);
            if names.is_empty() {
                return Err(CommandSyntaxError::InvalidArgument(
                    "execute as requires at least one name".to_string(),
                ));
            }
            let inner = parse_execute(dispatcher, input, tail, source)?;
            Ok(inner.prepend(Stage::modify(
                input,
                vec![names.to_string()],
                Some(RedirectModifier::simple(
                    |ctx: &CommandContext<'_, ScriptSource>| {
                        let names = ctx.argument(0)?;
                        Ok(names
                            .split(',')
                            .filter(|n| !n.is_empty())
                            .map(|n| ctx.source().with_name(n))
                            .collect())
                    },
                )),
                true,
            )))
        }
        "if" => {
            let (kind, tail) = split_word(tail);
            if kind != "function" {
                return Err(CommandSyntaxError::InvalidArgument(format!(
                    "unsupported condition '{}'",
                    kind
                )));
            }
            let (id, tail) = split_word(tail);
            if id.is_empty() {
                return Err(CommandSyntaxError::InvalidArgument(
                    "execute if function requires a function id".to_string(),
                ));
            }
            let inner = parse_execute(dispatcher, input, tail, source)?;
            Ok(inner.prepend(Stage::modify(
                input,
                vec![id.to_string()],
                Some(RedirectModifier::custom(IfFunction)),
                false,
            )))
        }
        "" => Err(CommandSyntaxError::InvalidArgument(
            "execute requires 'run <command>'".to_string(),
        )),
        other => Err(CommandSyntaxError::InvalidArgument(format!(
            "unknown execute subcommand '{}'",
            other
        ))),
    }
}

/// `return <value>`: report the value and end the current frame.
struct ReturnValue;

impl WithErrorHandling<ScriptSource> for ReturnValue {
    fn run_guarded(
        &self,
        source: &ScriptSource,
        chain: &ContextChain<ScriptSource>,
        _modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, ScriptSource>,
    ) -> Result<(), CommandSyntaxError> {
        let value = CommandContext::new(source, chain.top()).integer_argument(0)?;
        source.callback().on_success(value);
        control.return_success(value);
        Ok(())
    }
}

/// `return fail`
struct ReturnFail;

impl CustomCommandExecutor<ScriptSource> for ReturnFail {
    fn run(
        &self,
        source: &ScriptSource,
        _chain: &ContextChain<ScriptSource>,
        _modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, ScriptSource>,
    ) {
        source.callback().on_failure();
        control.return_failure();
    }
}

/// `return run <command>`: drop the rest of the frame and hand the command's
/// result to whoever is waiting on it.
struct ReturnRun;

impl CustomModifierExecutor<ScriptSource> for ReturnRun {
    fn apply(
        &self,
        original_source: &ScriptSource,
        sources: &[ScriptSource],
        chain: &ContextChain<ScriptSource>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, ScriptSource>,
    ) {
        if sources.is_empty() {
            if modifiers.is_return() {
                control.queue_next(EntryAction::Fallthrough);
            }
            return;
        }
        control.discard_current_frame();
        let Some(next) = chain.next_stage() else {
            return;
        };
        let input = next.input().to_string();
        control.queue_next(EntryAction::Continuation(
            BuildContexts::new(input, next).continuation(
                original_source.clone(),
                sources.to_vec(),
                modifiers.set_return(),
            ),
        ));
    }
}

/// `function <id>`
struct RunFunction;

impl WithErrorHandling<ScriptSource> for RunFunction {
    fn run_guarded(
        &self,
        source: &ScriptSource,
        chain: &ContextChain<ScriptSource>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, ScriptSource>,
    ) -> Result<(), CommandSyntaxError> {
        let id = CommandContext::new(source, chain.top()).argument(0)?;
        let function = source
            .function(id)
            .ok_or_else(|| CommandSyntaxError::UnknownFunction(id.to_string()))?;
        let (callback, return_parent_frame) = if modifiers.is_return() {
            (control.current_frame().return_value_consumer().clone(), true)
        } else {
            (source.callback(), false)
        };
        let call = CallFunction::new(function, callback, return_parent_frame);
        control.queue_next(UnboundEntryAction::CallFunction(call).bind(source.clone()));
        Ok(())
    }
}

/// `execute if function <id>`: keep the sources for which the function
/// returns a non-zero value.
struct IfFunction;

impl CustomModifierExecutor<ScriptSource> for IfFunction {
    fn apply(
        &self,
        original_source: &ScriptSource,
        sources: &[ScriptSource],
        chain: &ContextChain<ScriptSource>,
        modifiers: ChainModifiers,
        control: &mut ExecutionControl<'_, ScriptSource>,
    ) {
        let id = chain.top().arguments().first().cloned().unwrap_or_default();
        let Some(function) = original_source.function(&id) else {
            original_source.handle_error(
                &CommandSyntaxError::UnknownFunction(id),
                modifiers.is_forked(),
                control.tracer(),
            );
            return;
        };
        let fork_limit = control.fork_limit();
        if sources.len() > fork_limit {
            original_source.handle_error(
                &CommandSyntaxError::ForkLimitReached(fork_limit),
                modifiers.is_forked(),
                control.tracer(),
            );
            return;
        }
        let Some(next) = chain.next_stage() else {
            return;
        };

        let passed = Rc::new(RefCell::new(Vec::new()));
        for source in sources {
            let sink = Rc::clone(&passed);
            let candidate = source.clone();
            let output = CommandResultCallback::new(move |success, result| {
                if success && result != 0 {
                    sink.borrow_mut().push(candidate.clone());
                }
            });
            let function = Rc::clone(&function);
            let caller = source.with_callback(CommandResultCallback::EMPTY);
            control.queue_next(EntryAction::Isolated(IsolatedCall::new(
                move |isolated: &mut ExecutionControl<'_, ScriptSource>| {
                    let callback = isolated.current_frame().return_value_consumer().clone();
                    let call = CallFunction::new(function, callback, true);
                    isolated.queue_next(UnboundEntryAction::CallFunction(call).bind(caller));
                },
                output,
            )));
        }

        let original = original_source.clone();
        control.queue_next(EntryAction::custom(
            move |control: &mut ExecutionControl<'_, ScriptSource>| {
                let sources = passed.take();
                let input = next.input().to_string();
                control.queue_next(EntryAction::Continuation(
                    BuildContexts::new(input, next).continuation(original, sources, modifiers),
                ));
            },
        ));
    }
}
