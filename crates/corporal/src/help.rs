//! Plain-text help rendering.

use crate::argument::ArgSpec;
use crate::command::Command;
use crate::option::{OptSpec, Placeholder};
use crate::program::{DEFAULT_COMMAND, Program};

const GLOBAL_ROWS: &[(&str, &str, &str, &str)] = &[
    ("h", "help", "-h, --help", "Display help"),
    ("V", "version", "-V, --version", "Display version"),
    ("", "silent", "--silent", "Disable all output"),
    ("", "quiet", "--quiet", "Quiet mode - only displays warn and error messages"),
    ("v", "verbose", "-v, --verbose", "Verbose mode - will also output debug messages"),
];

/// Program help: usage, commands and the default command's fields.
pub fn render_program(program: &Program) -> String {
    let mut out = header(program.bin(), program.version(), program.description());

    let visible: Vec<&Command> = program.commands().iter().filter(|c| !c.is_hidden()).collect();
    out.push_str("\nUsage:\n");
    if !visible.is_empty() {
        out.push_str(&format!("  {} <command> [options]\n", program.bin()));
    }
    if let Some(fallback) = program.fallback() {
        out.push_str(&format!("  {}\n", usage_line(program.bin(), fallback)));
    }

    if !visible.is_empty() {
        out.push_str("\nCommands:\n");
        let mut rows: Vec<(String, String)> = visible
            .iter()
            .map(|c| {
                let left = match c.alias_name() {
                    Some(alias) => format!("{} ({alias})", c.name()),
                    None => c.name().to_string(),
                };
                (left, c.description().trim().to_string())
            })
            .collect();
        rows.push((
            "help <command>".to_string(),
            "Display help for a specific command".to_string(),
        ));
        push_rows(&mut out, &rows);
    }

    if let Some(fallback) = program.fallback() {
        push_fields(&mut out, fallback);
    }
    push_globals(&mut out, program.fallback());
    push_custom(&mut out, program.help_text());
    out
}

/// Help for one command.
pub fn render_command(program: &Program, command: &Command) -> String {
    let title = if command.name() == DEFAULT_COMMAND {
        program.bin().to_string()
    } else {
        format!("{} {}", program.bin(), command.name())
    };
    let mut out = header(&title, "", command.description());
    out.push_str(&format!("\nUsage: {}\n", usage_line(program.bin(), command)));
    if let Some(alias) = command.alias_name() {
        out.push_str(&format!("Alias: {alias}\n"));
    }
    push_fields(&mut out, command);
    push_globals(&mut out, Some(command));
    push_custom(&mut out, command.help_text());
    out
}

pub fn render_version(program: &Program) -> String {
    if program.version().trim().is_empty() {
        format!("{}\n", program.bin())
    } else {
        format!("{}\n", program.version().trim())
    }
}

fn header(title: &str, version: &str, description: &str) -> String {
    let mut out = title.to_string();
    if !version.trim().is_empty() {
        out.push(' ');
        out.push_str(version.trim());
    }
    if !description.trim().is_empty() {
        out.push_str(" - ");
        out.push_str(description.trim());
    }
    out.push('\n');
    out
}

fn usage_line(bin: &str, command: &Command) -> String {
    let mut parts = vec![bin.to_string()];
    if command.name() != DEFAULT_COMMAND {
        parts.push(command.name().to_string());
    }
    if command.options().iter().any(OptSpec::is_required) {
        parts.push("<options>".to_string());
    } else {
        parts.push("[options]".to_string());
    }
    parts.extend(command.arguments().iter().map(|a| a.synopsis().to_string()));
    parts.join(" ")
}

fn push_fields(out: &mut String, command: &Command) {
    if !command.arguments().is_empty() {
        out.push_str("\nArguments:\n");
        let rows: Vec<(String, String)> = command
            .arguments()
            .iter()
            .map(|a| (a.synopsis().to_string(), argument_help(a)))
            .collect();
        push_rows(out, &rows);
    }
    if !command.options().is_empty() {
        out.push_str("\nOptions:\n");
        let rows: Vec<(String, String)> = command
            .options()
            .iter()
            .map(|o| (option_left(o), option_help(o)))
            .collect();
        push_rows(out, &rows);
    }
}

fn push_globals(out: &mut String, command: Option<&Command>) {
    let rows: Vec<(String, String)> = GLOBAL_ROWS
        .iter()
        .filter(|(short, long, _, _)| {
            !command.is_some_and(|c| c.declares(long) || (!short.is_empty() && c.declares(short)))
        })
        .map(|(_, _, left, help)| (left.to_string(), help.to_string()))
        .collect();
    if rows.is_empty() {
        return;
    }
    out.push_str("\nGlobal Options:\n");
    push_rows(out, &rows);
}

fn push_custom(out: &mut String, text: Option<&str>) {
    if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
        out.push('\n');
        out.push_str(text.trim_end());
        out.push('\n');
    }
}

fn push_rows(out: &mut String, rows: &[(String, String)]) {
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}

fn option_left(opt: &OptSpec) -> String {
    let mut out = opt.dashed_flags().join(", ");
    match opt.placeholder() {
        Placeholder::None => {}
        Placeholder::Required(name) => out.push_str(&format!(" <{name}>")),
        Placeholder::Optional(name) => out.push_str(&format!(" [{name}]")),
    }
    out
}

fn option_help(opt: &OptSpec) -> String {
    let mut out = opt.description().trim().to_string();
    if opt.is_required() {
        annotate(&mut out, "(required)".to_string());
    }
    let choices = opt.choices();
    if !choices.is_empty() {
        annotate(&mut out, format!("[one of: {}]", choices.join(", ")));
    }
    if let Some(default) = opt.default_value() {
        annotate(&mut out, format!("[default: {default}]"));
    }
    out
}

fn argument_help(arg: &ArgSpec) -> String {
    let mut out = arg.description().trim().to_string();
    let choices = arg.choices();
    if !choices.is_empty() {
        annotate(&mut out, format!("[one of: {}]", choices.join(", ")));
    }
    if let Some(default) = arg.default_value() {
        annotate(&mut out, format!("[default: {default}]"));
    }
    out
}

fn annotate(out: &mut String, note: String) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(&note);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::INT;

    fn pizza() -> Program {
        let mut prog = Program::new()
            .with_name("pizza")
            .with_version("1.0.0")
            .with_help("My Custom help !!");
        prog.command("order", "Order a pizza")
            .alias("give-it-to-me")
            .argument(ArgSpec::new("<kind>", "Kind of pizza").unwrap().with_validator([
                "margherita",
                "hawaiian",
            ]))
            .unwrap()
            .option(
                OptSpec::new("-n, --number <num>", "Number of pizza")
                    .unwrap()
                    .with_validator(INT)
                    .with_default(1),
            )
            .unwrap()
            .option(OptSpec::new("-p, --pay-by <mean>", "Pay by option").unwrap().required(true))
            .unwrap();
        prog.command("secret", "Not listed").hidden(true);
        prog
    }

    #[test]
    fn program_help_lists_visible_commands() {
        let text = render_program(&pizza());
        assert!(text.starts_with("pizza 1.0.0\n"));
        assert!(text.contains("order (give-it-to-me)"));
        assert!(text.contains("Order a pizza"));
        assert!(!text.contains("secret"));
        assert!(text.contains("help <command>"));
        assert!(text.trim_end().ends_with("My Custom help !!"));
    }

    #[test]
    fn command_help_annotates_fields() {
        let prog = pizza();
        let order = prog.find_command("order").unwrap();
        let text = render_command(&prog, order);
        assert!(text.contains("Usage: pizza order <options> <kind>"));
        assert!(text.contains("[one of: margherita, hawaiian]"));
        assert!(text.contains("-n, --number <num>"));
        assert!(text.contains("Number of pizza [default: 1]"));
        assert!(text.contains("Pay by option (required)"));
        assert!(text.contains("-V, --version"));
    }

    #[test]
    fn version_is_printed_alone() {
        assert_eq!(render_version(&pizza()), "1.0.0\n");
    }
}
