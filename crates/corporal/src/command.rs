use crate::argument::{self, ArgSpec};
use crate::deferred::Deferred;
use crate::error::Error;
use crate::option::{self, GLOBAL_FLAGS, OptSpec};
use crate::validate::{Bound, Ledger};
use crate::value::Values;
use corporal_argv::{ParsedArgv, Schema};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub(crate) type ActionFn =
    Arc<dyn Fn(Values, Values) -> Deferred<'static, anyhow::Result<()>> + Send + Sync>;

/// A named unit of behaviour: arguments, options and one action.
pub struct Command {
    name: String,
    alias: Option<String>,
    description: String,
    arguments: Vec<ArgSpec>,
    options: Vec<OptSpec>,
    action: Option<ActionFn>,
    default: bool,
    hidden: bool,
    help: Option<String>,
}

impl Command {
    pub(crate) fn new(name: &str, description: &str) -> Self {
        Self {
            name: normalize_words(name),
            alias: None,
            description: description.to_string(),
            arguments: Vec::new(),
            options: Vec::new(),
            action: None,
            default: false,
            hidden: false,
            help: None,
        }
    }

    pub fn alias(&mut self, alias: &str) -> &mut Self {
        self.alias = Some(normalize_words(alias));
        self
    }

    /// Hide the command from the program's help listing.
    pub fn hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    /// Extra text appended to the command's help.
    pub fn help(&mut self, text: &str) -> &mut Self {
        self.help = Some(text.to_string());
        self
    }

    /// Run this command when no command name matches.
    pub fn default_command(&mut self, default: bool) -> &mut Self {
        self.default = default;
        self
    }

    pub fn argument(&mut self, spec: ArgSpec) -> Result<&mut Self, Error> {
        if let Some(last) = self.arguments.last() {
            let reason = if last.is_variadic() {
                Some("no argument may follow a variadic argument")
            } else if spec.is_required() && !last.is_required() {
                Some("a required argument may not follow an optional one")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(Error::ArgumentSyntax {
                    synopsis: spec.synopsis().to_string(),
                    reason: reason.to_string(),
                });
            }
        }
        self.arguments.push(spec);
        Ok(self)
    }

    pub fn option(&mut self, spec: OptSpec) -> Result<&mut Self, Error> {
        for flag in [spec.short(), spec.long()].into_iter().flatten() {
            if self.options.iter().any(|o| o.matches(flag)) {
                return Err(Error::DuplicateOption {
                    command: self.name.clone(),
                    flag: crate::error::dashed(flag),
                });
            }
        }
        self.options.push(spec);
        Ok(self)
    }

    pub fn action<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Values, &Values) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(
            move |args: Values, options: Values| -> Deferred<'static, anyhow::Result<()>> {
                Deferred::ready(f(&args, &options))
            },
        ));
        self
    }

    pub fn action_async<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Values, Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.action = Some(Arc::new(
            move |args: Values, options: Values| -> Deferred<'static, anyhow::Result<()>> {
                Deferred::pending(f(args, options))
            },
        ));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn arguments(&self) -> &[ArgSpec] {
        &self.arguments
    }

    pub fn options(&self) -> &[OptSpec] {
        &self.options
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn find_argument(&self, name: &str) -> Option<&ArgSpec> {
        self.arguments.iter().find(|a| a.name() == name)
    }

    /// Look up an option by bare flag (`f`, `file`) or bag key.
    pub fn find_option(&self, name: &str) -> Option<&OptSpec> {
        self.options
            .iter()
            .find(|o| o.matches(name) || o.key() == name)
    }

    /// Whether the command declares `flag` itself, shadowing a global flag.
    pub fn declares(&self, flag: &str) -> bool {
        self.options.iter().any(|o| o.matches(flag))
    }

    pub(crate) fn answers_to(&self, words: &str) -> bool {
        self.name == words || self.alias.as_deref() == Some(words)
    }

    /// Tokenizer schema for this command's flags plus the global flags.
    pub fn argv_schema(&self) -> Schema {
        let mut schema = Schema::new();
        for opt in &self.options {
            for flag in opt.dashed_flags() {
                schema = if opt.is_switch() {
                    schema.switch(flag)
                } else {
                    schema.value_flag(flag)
                };
            }
        }
        for global in GLOBAL_FLAGS {
            if !self.declares(global) {
                schema = schema.switch(crate::error::dashed(global));
            }
        }
        schema
    }

    /// Bind and validate positional tokens and the flags of `parsed` against
    /// this command's declarations.
    pub fn validate(
        &self,
        positionals: &[String],
        parsed: &ParsedArgv,
    ) -> Deferred<'static, Result<Bound, Error>> {
        tracing::debug!(command = %self.name, args = positionals.len(), "validating call");
        let mut ledger = Ledger::new();
        let halted = argument::bind(&self.name, &self.arguments, positionals, &mut ledger)
            .and_then(|()| option::bind(&self.name, &self.options, parsed, &mut ledger))
            .err();
        ledger.finish(halted)
    }

    pub(crate) fn action_fn(&self) -> Option<ActionFn> {
        self.action.clone()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("has_action", &self.action.is_some())
            .field("default", &self.default)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

fn normalize_words(words: &str) -> String {
    words.split_whitespace().collect::<Vec<_>>().join(" ")
}
