//! Command resolution, argument binding and validation for command-line
//! programs.
//!
//! A [`Program`] holds commands, each with positional arguments ([`ArgSpec`]),
//! options ([`OptSpec`]) and an action. Given an argument vector the program
//! picks the command, binds and validates every field, then calls the action
//! with the typed [`Values`]. Validators and actions may be synchronous or
//! return futures; [`Deferred`] keeps fully synchronous runs free of any
//! executor.
//!
//! ```no_run
//! use corporal::{ArgSpec, Exit, INT, OptSpec, Program};
//!
//! # fn main() -> Result<(), corporal::Error> {
//! let mut program = Program::new().with_name("pizza").with_version("1.0.0");
//! let kind = ArgSpec::new("<kind>", "Kind of pizza")?.with_validator(["margherita", "hawaiian"]);
//! let number = OptSpec::new("-n, --number <num>", "Number of pizza")?
//!     .with_validator(INT)
//!     .with_default(1);
//! program
//!     .command("order", "Order a pizza")
//!     .argument(kind)?
//!     .option(number)?
//!     .action(|args, options| {
//!         println!("{:?} x{:?}", args.get_str("kind"), options.get_i64("number"));
//!         Ok(())
//!     });
//!
//! let argv: Vec<String> = std::env::args().skip(1).collect();
//! let exit = program.parse(&argv).into_ready().unwrap_or(Exit::Failure);
//! std::process::exit(exit.code());
//! # }
//! ```

mod argument;
mod coerce;
mod command;
mod complete;
mod deferred;
mod error;
mod help;
mod option;
mod program;
mod report;
mod schema;
mod suggest;
mod validate;
mod validator;
mod value;

pub use argument::ArgSpec;
pub use coerce::{
    ARRAY, BOOL, BOOLEAN, CoercionError, FLOAT, INT, INTEGER, LIST, Primitive, REPEATABLE,
    REQUIRED, STRING, TypeFlags,
};
pub use command::Command;
pub use complete::{Candidates, Completer};
pub use deferred::Deferred;
pub use error::{Error, Result, dashed};
pub use help::{render_command, render_program, render_version};
pub use option::{GLOBAL_FLAGS, OptSpec, Placeholder};
pub use program::{DEFAULT_COMMAND, Exit, Program, Resolution, Verbosity};
pub use report::{MemoryReporter, Report, Reporter, StdReporter, render_fatal};
pub use suggest::{MAX_DISTANCE, highlight_diff, suggestions};
pub use validate::Bound;
pub use validator::{Outcome, Validator};
pub use value::{Value, Values};

pub use corporal_argv::{FlagValue, ParsedArgv};
pub use corporal_schema::ProgramSchema;
