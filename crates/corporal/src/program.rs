use crate::argument::ArgSpec;
use crate::command::Command;
use crate::deferred::Deferred;
use crate::error::Error;
use crate::help;
use crate::option::OptSpec;
use crate::report::{Reporter, StdReporter};
use crate::value::{Value, Values};
use corporal_argv::{ParsedArgv, Schema, looks_like_flag, tokenize};
use heck::ToKebabCase;
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Name of the command created by declaring arguments, options or an action
/// directly on the program.
pub const DEFAULT_COMMAND: &str = "_default";

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Action completed, or help/version was printed on request.
    Success,
    /// No command matched; program help was printed.
    Usage,
    /// A fatal error was reported.
    Failure,
}

impl Exit {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Usage => 1,
            Self::Failure => 2,
        }
    }
}

/// Output level selected by the global `--quiet`/`--silent` and
/// `-v`/`--verbose` flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    fn detect(parsed: &ParsedArgv, command: &Command) -> Self {
        let global = |flag: &str| parsed.has_flag(flag) && !command.declares(flag);
        if global("quiet") || global("silent") {
            Self::Quiet
        } else if global("v") || global("verbose") {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Outcome of resolving one invocation, without dispatching it.
#[derive(Debug)]
pub enum Resolution<'p> {
    /// Help was requested; `None` is the program help.
    Help(Option<&'p Command>),
    Version,
    /// Nothing matched and there is no default command.
    NoMatch,
    Invocation {
        command: &'p Command,
        args: Values,
        options: Values,
        verbosity: Verbosity,
    },
}

enum Route<'p> {
    Help(Option<&'p Command>),
    Version,
    Invoke {
        command: &'p Command,
        consumed: usize,
    },
    NoMatch,
}

/// The root registry: metadata, commands and the fallback default command.
pub struct Program {
    name: String,
    version: String,
    description: String,
    bin: Option<String>,
    help: Option<String>,
    commands: Vec<Command>,
    fallback: Option<Command>,
    reporter: Arc<dyn Reporter>,
}

impl Default for Program {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            description: String::new(),
            bin: None,
            help: None,
            commands: Vec::new(),
            fallback: None,
            reporter: Arc::new(StdReporter),
        }
    }
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = Some(bin.into());
        self
    }

    /// Extra text appended to the program help.
    pub fn with_help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Executable name used in usage lines.
    pub fn bin(&self) -> &str {
        match (&self.bin, self.name.is_empty()) {
            (Some(bin), _) => bin,
            (None, false) => &self.name,
            (None, true) => "program",
        }
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Declare a command, or return the existing one with the same name.
    pub fn command(&mut self, name: &str, description: &str) -> &mut Command {
        let command = Command::new(name, description);
        match self.commands.iter().position(|c| c.name() == command.name()) {
            Some(idx) => &mut self.commands[idx],
            None => {
                tracing::trace!(command = %command.name(), "command declared");
                self.commands.push(command);
                let last = self.commands.len() - 1;
                &mut self.commands[last]
            }
        }
    }

    /// Declare an argument on the program's default command.
    pub fn argument(&mut self, spec: ArgSpec) -> Result<&mut Command, Error> {
        self.fallback_mut().argument(spec)
    }

    /// Declare an option on the program's default command.
    pub fn option(&mut self, spec: OptSpec) -> Result<&mut Command, Error> {
        self.fallback_mut().option(spec)
    }

    pub fn action<F>(&mut self, f: F) -> &mut Command
    where
        F: Fn(&Values, &Values) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.fallback_mut().action(f)
    }

    pub fn action_async<F, Fut>(&mut self, f: F) -> &mut Command
    where
        F: Fn(Values, Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.fallback_mut().action_async(f)
    }

    fn fallback_mut(&mut self) -> &mut Command {
        self.fallback
            .get_or_insert_with(|| Command::new(DEFAULT_COMMAND, ""))
    }

    /// Registered commands in declaration order, without the fallback.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Command run when nothing matches: an explicitly marked default
    /// command, else the program-level one.
    pub fn default_command(&self) -> Option<&Command> {
        self.commands
            .iter()
            .find(|c| c.is_default())
            .or(self.fallback.as_ref())
    }

    pub(crate) fn fallback(&self) -> Option<&Command> {
        self.fallback.as_ref()
    }

    /// Look up a command by name or alias.
    pub fn find_command(&self, words: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.answers_to(words))
    }

    /// Command by name or alias, for attaching actions after declaration.
    /// `_default` selects the program-level command.
    pub fn command_mut(&mut self, name: &str) -> Result<&mut Command, Error> {
        if name == DEFAULT_COMMAND {
            return Ok(self.fallback_mut());
        }
        self.commands
            .iter_mut()
            .find(|c| c.answers_to(name))
            .ok_or_else(|| Error::UnknownCommand {
                name: name.to_string(),
            })
    }

    /// Drop every command, including the default one.
    pub fn reset(&mut self) -> &mut Self {
        self.commands.clear();
        self.fallback = None;
        self
    }

    fn longest_match(&self, tokens: &[String]) -> Option<(&Command, usize)> {
        (1..=tokens.len()).rev().find_map(|n| {
            self.find_command(&tokens[..n].join(" "))
                .map(|command| (command, n))
        })
    }

    fn route(&self, parsed: &ParsedArgv) -> Route<'_> {
        let positionals = parsed.positionals();
        if positionals.first().map(String::as_str) == Some("help") {
            let target = self.longest_match(&positionals[1..]).map(|(c, _)| c);
            tracing::debug!(command = ?target.map(Command::name), "help requested");
            return Route::Help(target);
        }

        let matched = self
            .longest_match(positionals)
            .or_else(|| self.default_command().map(|c| (c, 0)));
        let intercepts = |flags: [&str; 2]| {
            flags.iter().any(|flag| {
                parsed.has_flag(flag) && !matched.is_some_and(|(c, _)| c.declares(flag))
            })
        };

        if intercepts(["V", "version"]) {
            return Route::Version;
        }
        let Some((command, consumed)) = matched else {
            if intercepts(["h", "help"]) {
                return Route::Help(None);
            }
            tracing::debug!("no command matched");
            return Route::NoMatch;
        };
        if intercepts(["h", "help"]) {
            let target = (command.name() != DEFAULT_COMMAND).then_some(command);
            return Route::Help(target);
        }
        tracing::debug!(command = %command.name(), consumed, "command matched");
        Route::Invoke { command, consumed }
    }

    /// Resolve an invocation to its command and validated values.
    pub fn resolve<'p>(
        &'p self,
        parsed: &ParsedArgv,
    ) -> Deferred<'p, Result<Resolution<'p>, Error>> {
        match self.route(parsed) {
            Route::Help(target) => Deferred::ready(Ok(Resolution::Help(target))),
            Route::Version => Deferred::ready(Ok(Resolution::Version)),
            Route::NoMatch => Deferred::ready(Ok(Resolution::NoMatch)),
            Route::Invoke { command, consumed } => {
                let verbosity = Verbosity::detect(parsed, command);
                let rest = parsed.positionals().get(consumed..).unwrap_or_default();
                command
                    .validate(rest, parsed)
                    .narrow()
                    .map(move |bound| {
                        bound.map(|(args, options)| Resolution::Invocation {
                            command,
                            args,
                            options,
                            verbosity,
                        })
                    })
            }
        }
    }

    /// Resolve, then print help/version or dispatch the action. Every failure
    /// reaches the reporter exactly once.
    pub fn run(&self, parsed: &ParsedArgv) -> Deferred<'static, Exit> {
        let reporter = Arc::clone(&self.reporter);
        let (command, consumed) = match self.route(parsed) {
            Route::Help(target) => {
                let text = match target {
                    Some(command) => help::render_command(self, command),
                    None => help::render_program(self),
                };
                reporter.help(&text);
                return Deferred::ready(Exit::Success);
            }
            Route::Version => {
                reporter.version(&help::render_version(self));
                return Deferred::ready(Exit::Success);
            }
            Route::NoMatch => {
                reporter.help(&help::render_program(self));
                return Deferred::ready(Exit::Usage);
            }
            Route::Invoke { command, consumed } => (command, consumed),
        };

        let verbose = Verbosity::detect(parsed, command) == Verbosity::Verbose;
        let name = command.name().to_string();
        let action = command.action_fn();
        let rest = parsed.positionals().get(consumed..).unwrap_or_default();
        command
            .validate(rest, parsed)
            .and_then(move |bound| {
                let (args, options) = match bound {
                    Ok(bound) => bound,
                    Err(err) => return fail(reporter.as_ref(), &err, verbose),
                };
                let Some(action) = action else {
                    return fail(reporter.as_ref(), &Error::NoAction { command: name }, verbose);
                };
                tracing::debug!(command = %name, "dispatching action");
                action(args, options).map(move |result| match result {
                    Ok(()) => Exit::Success,
                    Err(source) => {
                        let err = Error::Action {
                            command: name,
                            source,
                        };
                        reporter.fatal(&err, verbose);
                        Exit::Failure
                    }
                })
            })
    }

    /// Tokenize `argv` (program name already removed) for the command it
    /// names, then [`run`](Self::run) it.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Deferred<'static, Exit> {
        let parsed = tokenize(argv, &self.argv_schema(argv));
        self.run(&parsed)
    }

    /// Run `args` with options given by bag key; camel-cased keys become
    /// kebab-cased flags and values are passed in their string form. A list
    /// given for a repeatable option counts as one occurrence per element.
    pub fn exec<S: AsRef<str>>(
        &self,
        args: &[S],
        options: IndexMap<String, Value>,
    ) -> Deferred<'static, Exit> {
        let mut parsed = ParsedArgv::new();
        for arg in args {
            parsed.push_positional(arg.as_ref());
        }
        let command = match self.route(&parsed) {
            Route::Invoke { command, .. } => Some(command),
            _ => None,
        };
        for (key, value) in options {
            let flag = key.to_kebab_case();
            let repeatable = command
                .and_then(|c| c.find_option(&flag))
                .is_some_and(OptSpec::is_repeatable);
            match value {
                Value::Bool(true) => parsed.push_flag(flag, None),
                Value::List(items) if repeatable => {
                    for item in items {
                        parsed.push_flag(flag.clone(), Some(item.to_string()));
                    }
                }
                other => parsed.push_flag(flag, Some(other.to_string())),
            }
        }
        self.run(&parsed)
    }

    /// Tokenizer schema for the command `argv` most likely names. Leading
    /// tokens up to the first non-global flag are command-name candidates.
    fn argv_schema<S: AsRef<str>>(&self, argv: &[S]) -> Schema {
        const SWITCHES: [&str; 4] = ["-v", "--verbose", "--quiet", "--silent"];
        let words: Vec<String> = argv
            .iter()
            .map(|a| a.as_ref())
            .filter(|a| !SWITCHES.contains(a))
            .take_while(|a| !looks_like_flag(a))
            .map(str::to_string)
            .collect();
        let candidate = match words.first().map(String::as_str) {
            Some("help") => None,
            _ => self
                .longest_match(&words)
                .map(|(c, _)| c)
                .or_else(|| self.default_command()),
        };
        match candidate {
            Some(command) => command.argv_schema(),
            None => Command::new(DEFAULT_COMMAND, "").argv_schema(),
        }
    }
}

fn fail(reporter: &dyn Reporter, err: &Error, verbose: bool) -> Deferred<'static, Exit> {
    tracing::debug!(kind = err.name(), "invocation failed");
    reporter.fatal(err, verbose);
    Deferred::ready(Exit::Failure)
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("commands", &self.commands)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
