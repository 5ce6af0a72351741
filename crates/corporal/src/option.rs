use crate::coerce::{BOOLEAN, CoercionError, TypeFlags};
use crate::complete::{self, Completer};
use crate::deferred::Deferred;
use crate::error::Error;
use crate::suggest;
use crate::validate::{self, Ledger, Settled, Target};
use crate::validator::Validator;
use crate::value::Value;
use corporal_argv::ParsedArgv;
use heck::ToLowerCamelCase;

/// Flags every command accepts without declaring them.
pub const GLOBAL_FLAGS: &[&str] = &[
    "h", "help", "V", "version", "v", "verbose", "quiet", "silent",
];

/// What follows the flags in an option synopsis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// No placeholder: an implicit boolean.
    None,
    /// `<value>`: the option needs a value when given.
    Required(String),
    /// `[value]`: the option may be given bare.
    Optional(String),
}

/// A declared option.
#[derive(Debug, Clone)]
pub struct OptSpec {
    synopsis: String,
    description: String,
    short: Option<String>,
    long: Option<String>,
    placeholder: Placeholder,
    validator: Option<Validator>,
    default: Option<Value>,
    required: bool,
    completer: Option<Completer>,
}

impl OptSpec {
    /// Parse a synopsis such as `-f, --file <file>`, `--with-openssl [path]`
    /// or `-b, --bool`.
    pub fn new(synopsis: &str, description: &str) -> Result<Self, Error> {
        let synopsis = synopsis.trim();
        let syntax = |reason: String| Error::OptionSyntax {
            synopsis: synopsis.to_string(),
            reason,
        };
        let mut short = None;
        let mut long = None;
        let mut placeholder = Placeholder::None;

        for token in synopsis.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
            if placeholder != Placeholder::None {
                return Err(syntax(format!("unexpected '{token}' after the value placeholder")));
            }
            if let Some(name) = token.strip_prefix("--") {
                if name.is_empty() || !is_flag_name(name) {
                    return Err(syntax(format!("invalid long flag '{token}'")));
                }
                if long.replace(name.to_string()).is_some() {
                    return Err(syntax("more than one long flag".to_string()));
                }
            } else if let Some(name) = token.strip_prefix('-') {
                if name.chars().count() != 1 || !is_flag_name(name) {
                    return Err(syntax(format!("invalid short flag '{token}'")));
                }
                if short.replace(name.to_string()).is_some() {
                    return Err(syntax("more than one short flag".to_string()));
                }
            } else if let Some(name) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                placeholder = Placeholder::Required(name.to_string());
            } else if let Some(name) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                placeholder = Placeholder::Optional(name.to_string());
            } else {
                return Err(syntax(format!("unexpected '{token}'")));
            }
        }
        if short.is_none() && long.is_none() {
            return Err(syntax("no flag given".to_string()));
        }

        Ok(Self {
            synopsis: synopsis.to_string(),
            description: description.to_string(),
            short,
            long,
            placeholder,
            validator: None,
            default: None,
            required: false,
            completer: None,
        })
    }

    pub fn with_validator(mut self, validator: impl Into<Validator>) -> Self {
        self.validator = Some(validator.into());
        self
    }

    /// Value used when the option is not supplied. The default goes through
    /// the validator like a supplied value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_completer(mut self, completer: Completer) -> Self {
        self.completer = Some(completer);
        self
    }

    pub fn synopsis(&self) -> &str {
        &self.synopsis
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    pub fn is_required(&self) -> bool {
        self.required
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

    /// Key in the option bag: the camel-cased long name, or the bare short
    /// letter.
    pub fn key(&self) -> String {
        match (&self.long, &self.short) {
            (Some(long), _) => long.to_lower_camel_case(),
            (None, Some(short)) => short.clone(),
            (None, None) => String::new(),
        }
    }

    /// Name used in error messages, without dashes.
    pub fn display_name(&self) -> &str {
        self.long.as_deref().or(self.short.as_deref()).unwrap_or_default()
    }

    /// Whether the flag never takes a value on the command line.
    pub fn is_switch(&self) -> bool {
        self.placeholder == Placeholder::None
            && match &self.validator {
                None => true,
                Some(v) => v.type_flags().is_some_and(|t| t.code() == BOOLEAN),
            }
    }

    pub fn matches(&self, flag: &str) -> bool {
        self.short.as_deref() == Some(flag) || self.long.as_deref() == Some(flag)
    }

    /// Flags as typed on the command line (`-f`, `--file`).
    pub fn dashed_flags(&self) -> Vec<String> {
        let mut flags = Vec::with_capacity(2);
        if let Some(short) = &self.short {
            flags.push(format!("-{short}"));
        }
        if let Some(long) = &self.long {
            flags.push(format!("--{long}"));
        }
        flags
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

    /// Validate one occurrence; `None` means the flag was given bare.
    fn check(&self, command: &str, raw: Option<&str>) -> Settled {
        let invalid = |source: anyhow::Error| Error::InvalidOptionValue {
            command: command.to_string(),
            option: self.display_name().to_string(),
            value: raw.map(str::to_string),
            source,
        };
        let Some(raw) = raw else {
            let value: anyhow::Result<Value> = match (&self.validator, &self.placeholder) {
                (Some(Validator::Type(flags)), _) => flags.coerce(None).map_err(Into::into),
                (_, Placeholder::Required(_)) => Err(CoercionError::MissingValue.into()),
                _ => Ok(Value::Bool(true)),
            };
            return Deferred::ready(value.map_err(invalid));
        };
        let validator = match &self.validator {
            Some(v) => v,
            None if self.placeholder == Placeholder::None => {
                return Deferred::ready(implicit_bool(raw).map_err(invalid));
            }
            None => return Deferred::ready(Ok(Value::Str(raw.to_string()))),
        };
        match validator.validate(raw) {
            Ok(outcome) => {
                let command = command.to_string();
                let option = self.display_name().to_string();
                let value = raw.to_string();
                outcome.map(move |result| {
                    result.map_err(|source| Error::InvalidOptionValue {
                        command,
                        option,
                        value: Some(value),
                        source,
                    })
                })
            }
            Err(reason) => Deferred::ready(Err(Error::Validation {
                command: command.to_string(),
                field: format!("option {}", self.synopsis),
                reason,
            })),
        }
    }

    fn is_list(&self) -> bool {
        self.validator
            .as_ref()
            .and_then(Validator::type_flags)
            .is_some_and(|t| t.is_list())
    }

    pub(crate) fn is_repeatable(&self) -> bool {
        self.validator
            .as_ref()
            .and_then(Validator::type_flags)
            .is_some_and(|t| t.is_repeatable())
    }
}

fn is_flag_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn implicit_bool(raw: &str) -> anyhow::Result<Value> {
    let flags = TypeFlags::from_code(BOOLEAN).map_err(anyhow::Error::msg)?;
    Ok(flags.coerce(Some(raw))?)
}

/// Bind flag occurrences to `specs`, recording each bound option. Short and
/// long occurrences of one option are taken in command-line order.
pub(crate) fn bind(
    command: &str,
    specs: &[OptSpec],
    parsed: &ParsedArgv,
    ledger: &mut Ledger,
) -> Result<(), Error> {
    for key in parsed.flags().keys() {
        if specs.iter().any(|s| s.matches(key)) || GLOBAL_FLAGS.contains(&key.as_str()) {
            continue;
        }
        let suggestions = suggest::suggestions(key, specs.iter().filter_map(OptSpec::long));
        tracing::debug!(option = %key, ?suggestions, "unknown option");
        return Err(Error::UnknownOption {
            command: command.to_string(),
            option: key.clone(),
            suggestions,
        });
    }

    for spec in specs {
        let names: Vec<&str> = [spec.short(), spec.long()].into_iter().flatten().collect();
        let occurrences = parsed.occurrences(&names);

        let value = if occurrences.is_empty() {
            match (&spec.default, &spec.validator) {
                (Some(default), Some(_)) => spec.check(command, Some(&default.to_string())),
                (Some(default), None) => Deferred::ready(Ok(default.clone())),
                (None, _) if spec.required => {
                    return Err(Error::MissingOption {
                        command: command.to_string(),
                        option: spec.display_name().to_string(),
                    });
                }
                (None, _) if spec.placeholder == Placeholder::None => {
                    Deferred::ready(Ok(Value::Bool(false)))
                }
                (None, _) => continue,
            }
        } else if spec.is_repeatable() {
            let items = occurrences
                .iter()
                .map(|raw| spec.check(command, *raw))
                .collect();
            validate::gather(items)
        } else if spec.is_list()
            && occurrences.len() > 1
            && occurrences.iter().all(Option::is_some)
        {
            let joined = occurrences
                .iter()
                .flatten()
                .copied()
                .collect::<Vec<_>>()
                .join(",");
            spec.check(command, Some(&joined))
        } else {
            spec.check(command, occurrences.last().copied().flatten())
        };
        tracing::trace!(option = %spec.key(), "binding option");
        ledger.record(Target::Option, spec.key(), value)?;
    }
    Ok(())
}
