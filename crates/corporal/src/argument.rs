use crate::complete::{self, Completer};
use crate::deferred::Deferred;
use crate::error::Error;
use crate::validate::{self, Ledger, Settled, Target};
use crate::validator::Validator;
use crate::value::Value;
use heck::ToLowerCamelCase;

/// A declared positional argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    synopsis: String,
    name: String,
    description: String,
    required: bool,
    variadic: bool,
    validator: Option<Validator>,
    default: Option<Value>,
    completer: Option<Completer>,
}

impl ArgSpec {
    /// Parse `<name>`, `[name]`, `<name...>` or `[name...]`.
    pub fn new(synopsis: &str, description: &str) -> Result<Self, Error> {
        let synopsis = synopsis.trim();
        let syntax = |reason: &str| Error::ArgumentSyntax {
            synopsis: synopsis.to_string(),
            reason: reason.to_string(),
        };
        let (required, inner) = if let Some(inner) =
            synopsis.strip_prefix('<').and_then(|s| s.strip_suffix('>'))
        {
            (true, inner)
        } else if let Some(inner) = synopsis.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            (false, inner)
        } else {
            return Err(syntax("expected <name> or [name]"));
        };
        let (variadic, bare) = match inner.strip_suffix("...") {
            Some(bare) => (true, bare),
            None => (false, inner),
        };
        if bare.is_empty() {
            return Err(syntax("missing argument name"));
        }
        if !bare
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(syntax("argument names may only contain letters, digits, '-' and '_'"));
        }
        Ok(Self {
            synopsis: synopsis.to_string(),
            name: bare.to_lower_camel_case(),
            description: description.to_string(),
            required,
            variadic,
            validator: None,
            default: None,
            completer: None,
        })
    }

    pub fn with_validator(mut self, validator: impl Into<Validator>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    /// Value used when the argument is not supplied. Defaults are not
    /// validated.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_completer(mut self, completer: Completer) -> Self {
        self.completer = Some(completer);
        self
    }

    pub fn synopsis(&self) -> &str {
        &self.synopsis
    }

    /// Camel-cased key in the argument bag.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn completer(&self) -> Option<&Completer> {
        self.completer.as_ref()
    }

    pub fn choices(&self) -> Vec<String> {
        self.validator
            .as_ref()
            .map(Validator::choices_list)
            .unwrap_or_default()
    }

    pub async fn complete(&self) -> anyhow::Result<Vec<String>> {
        complete::candidates(self.completer.as_ref(), self.validator.as_ref()).await
    }

    fn check(&self, command: &str, raw: &str) -> Settled {
        let Some(validator) = &self.validator else {
            return Deferred::ready(Ok(Value::Str(raw.to_string())));
        };
        match validator.validate(raw) {
            Ok(outcome) => {
                let command = command.to_string();
                let argument = self.name.clone();
                let value = raw.to_string();
                outcome.map(move |result| {
                    result.map_err(|source| Error::InvalidArgumentValue {
                        command,
                        argument,
                        value,
                        source,
                    })
                })
            }
            Err(reason) => Deferred::ready(Err(Error::Validation {
                command: command.to_string(),
                field: format!("argument {}", self.synopsis),
                reason,
            })),
        }
    }
}

/// Bind positional tokens to `specs`, recording each bound argument.
pub(crate) fn bind(
    command: &str,
    specs: &[ArgSpec],
    tokens: &[String],
    ledger: &mut Ledger,
) -> Result<(), Error> {
    let min = specs.iter().filter(|s| s.required).count();
    let max = if specs.iter().any(|s| s.variadic) {
        None
    } else {
        Some(specs.len())
    };
    if tokens.len() < min || max.is_some_and(|max| tokens.len() > max) {
        return Err(Error::WrongNumberOfArguments {
            command: command.to_string(),
            got: tokens.len(),
            min,
            max,
        });
    }

    for (idx, spec) in specs.iter().enumerate() {
        let value = if spec.variadic {
            let rest = tokens.get(idx..).unwrap_or_default();
            if rest.is_empty() {
                None
            } else {
                let items = rest.iter().map(|raw| spec.check(command, raw)).collect();
                Some(validate::gather(items))
            }
        } else {
            tokens.get(idx).map(|raw| spec.check(command, raw))
        };
        let value = match (value, &spec.default) {
            (Some(value), _) => value,
            (None, Some(default)) => Deferred::ready(Ok(default.clone())),
            (None, None) => continue,
        };
        tracing::trace!(argument = %spec.name, "binding argument");
        ledger.record(Target::Argument, spec.name.clone(), value)?;
    }
    Ok(())
}
