//! Where help, version and fatal-error output goes.

use crate::error::Error;
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::sync::{Mutex, PoisonError};

/// Output sink for a program run.
///
/// `fatal` is called at most once per invocation, and never for an
/// invocation whose action was dispatched successfully.
pub trait Reporter: Send + Sync {
    fn help(&self, text: &str);
    fn version(&self, text: &str);
    fn fatal(&self, error: &Error, verbose: bool);
}

/// Writes help and version to stdout and errors to stderr. Suggestion
/// differences are bold when stderr is a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdReporter;

impl Reporter for StdReporter {
    fn help(&self, text: &str) {
        print!("{text}");
    }

    fn version(&self, text: &str) {
        print!("{text}");
    }

    fn fatal(&self, error: &Error, verbose: bool) {
        let text = if std::io::stderr().is_terminal() {
            render_fatal(error, verbose, &bold)
        } else {
            render_fatal(error, verbose, &|c: char| c.to_string())
        };
        eprint!("{text}");
    }
}

fn bold(c: char) -> String {
    format!("\x1b[1m{c}\x1b[22m")
}

/// `Error: <message>`, followed by the cause chain when `verbose`. `mark`
/// renders the characters in which a suggestion differs from what was typed.
pub fn render_fatal(error: &Error, verbose: bool, mark: &dyn Fn(char) -> String) -> String {
    let mut out = format!("Error: {}\n", error.message_with(mark));
    if !verbose {
        return out;
    }
    let _ = writeln!(out, "  kind: {}", error.name());
    // An action error displays as its own source, so its chain starts one deeper.
    let causes: Vec<&(dyn std::error::Error + 'static)> = match error {
        Error::Action { source, .. } => source.chain().skip(1).collect(),
        other => std::iter::successors(std::error::Error::source(other), |e| e.source()).collect(),
    };
    if !causes.is_empty() {
        out.push_str("\nCaused by:\n");
    }
    for (idx, cause) in causes.iter().enumerate() {
        let _ = writeln!(out, "  {idx}: {cause}");
    }
    out
}

/// One recorded call on a [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Help(String),
    Version(String),
    Fatal {
        name: &'static str,
        message: String,
        verbose: bool,
    },
}

/// Records every call instead of printing. Useful in tests.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of every fatal error reported so far.
    pub fn fatal_names(&self) -> Vec<&'static str> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                Report::Fatal { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, report: Report) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }
}

impl Reporter for MemoryReporter {
    fn help(&self, text: &str) {
        self.push(Report::Help(text.to_string()));
    }

    fn version(&self, text: &str) {
        self.push(Report::Version(text.to_string()));
    }

    fn fatal(&self, error: &Error, verbose: bool) {
        self.push(Report::Fatal {
            name: error.name(),
            message: error.to_string(),
            verbose,
        });
    }
}
