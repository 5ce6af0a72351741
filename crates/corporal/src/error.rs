use crate::suggest::highlight_diff;
use std::fmt::Write as _;

/// Every failure the framework reports.
///
/// Declaration-time variants (`OptionSyntax`, `ArgumentSyntax`,
/// `DuplicateOption`) are returned to the caller of the declaration method.
/// All others are produced while resolving an invocation and are handed to the
/// program's [`Reporter`](crate::Reporter) exactly once.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error in option synopsis: {synopsis} ({reason})")]
    OptionSyntax { synopsis: String, reason: String },

    #[error("Syntax error in argument synopsis: {synopsis} ({reason})")]
    ArgumentSyntax { synopsis: String, reason: String },

    #[error("Option {flag} is declared more than once on command '{command}'")]
    DuplicateOption { command: String, flag: String },

    #[error("Unknown option {}.{}", dashed(.option), did_you_mean(.option, .suggestions, &plain))]
    UnknownOption {
        command: String,
        option: String,
        suggestions: Vec<String>,
    },

    #[error("Missing option {}.", dashed(.option))]
    MissingOption { command: String, option: String },

    #[error("Invalid value {} for option {}. {source}", shown(.value), dashed(.option))]
    InvalidOptionValue {
        command: String,
        option: String,
        value: Option<String>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid value '{value}' for argument {argument}. {source}")]
    InvalidArgumentValue {
        command: String,
        argument: String,
        value: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Wrong number of arguments for command '{command}': got {got}, expected {}", expected(*.min, *.max))]
    WrongNumberOfArguments {
        command: String,
        got: usize,
        min: usize,
        max: Option<usize>,
    },

    #[error("Invalid validator for {field} on command '{command}': {reason}")]
    Validation {
        command: String,
        field: String,
        reason: String,
    },

    #[error("No action registered for command '{command}'")]
    NoAction { command: String },

    #[error("{source}")]
    Action {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unknown command '{name}'")]
    UnknownCommand { name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Stable taxonomy name, e.g. `"UnknownOptionError"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OptionSyntax { .. } => "OptionSyntaxError",
            Self::ArgumentSyntax { .. } => "ArgumentSyntaxError",
            Self::DuplicateOption { .. } => "DuplicateOptionError",
            Self::UnknownOption { .. } => "UnknownOptionError",
            Self::MissingOption { .. } => "MissingOptionError",
            Self::InvalidOptionValue { .. } => "InvalidOptionValueError",
            Self::InvalidArgumentValue { .. } => "InvalidArgumentValueError",
            Self::WrongNumberOfArguments { .. } => "WrongNumberOfArgumentError",
            Self::Validation { .. } => "ValidationError",
            Self::NoAction { .. } => "NoActionError",
            Self::Action { .. } => "ActionError",
            Self::UnknownCommand { .. } => "UnknownCommandError",
        }
    }

    /// The command the error is about, when there is one.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::DuplicateOption { command, .. }
            | Self::UnknownOption { command, .. }
            | Self::MissingOption { command, .. }
            | Self::InvalidOptionValue { command, .. }
            | Self::InvalidArgumentValue { command, .. }
            | Self::WrongNumberOfArguments { command, .. }
            | Self::Validation { command, .. }
            | Self::NoAction { command }
            | Self::Action { command, .. } => Some(command.as_str()),
            Self::UnknownCommand { name } => Some(name.as_str()),
            Self::OptionSyntax { .. } | Self::ArgumentSyntax { .. } => None,
        }
    }

    /// The `Display` message, except that the characters in which each
    /// suggestion differs from the unknown option pass through `mark`.
    pub fn message_with(&self, mark: &dyn Fn(char) -> String) -> String {
        match self {
            Self::UnknownOption {
                option,
                suggestions,
                ..
            } => format!(
                "Unknown option {}.{}",
                dashed(option),
                did_you_mean(option, suggestions, mark)
            ),
            other => other.to_string(),
        }
    }

    /// Whether the error was raised while declaring, not while parsing.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::OptionSyntax { .. } | Self::ArgumentSyntax { .. } | Self::DuplicateOption { .. }
        )
    }
}

/// `t` → `-t`, `time` → `--time`.
pub fn dashed(option: &str) -> String {
    if option.chars().count() == 1 {
        format!("-{option}")
    } else {
        format!("--{option}")
    }
}

fn shown(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "(empty)".to_string(),
    }
}

fn plain(c: char) -> String {
    c.to_string()
}

fn did_you_mean(option: &str, suggestions: &[String], mark: &dyn Fn(char) -> String) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let mut out = String::from(" Did you mean ");
    for (idx, s) in suggestions.iter().enumerate() {
        if idx > 0 {
            out.push_str(" or maybe ");
        }
        let _ = write!(out, "--{}", highlight_diff(option, s, mark));
    }
    out.push_str(" ?");
    out
}

fn expected(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("{min}"),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    }
}
