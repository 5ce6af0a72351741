//! Conversion between a [`Program`] and its serialisable declaration.

use crate::argument::ArgSpec;
use crate::command::Command;
use crate::error::Error;
use crate::option::OptSpec;
use crate::program::{DEFAULT_COMMAND, Program};
use crate::validator::Validator;
use crate::value::Value;
use corporal_schema::{
    ArgumentSchema, CommandSchema, OptionSchema, ProgramSchema, ValidatorSchema,
};

impl From<&ValidatorSchema> for Validator {
    fn from(schema: &ValidatorSchema) -> Self {
        match schema {
            ValidatorSchema::Choices(items) => Validator::Choices(items.clone()),
            ValidatorSchema::Pattern(re) => Validator::pattern(re).unwrap_or_else(|err| {
                tracing::warn!(pattern = %re, "invalid validator pattern: {err}");
                Validator::invalid(format!("invalid pattern /{re}/: {err}"))
            }),
            ValidatorSchema::Type(code) => match u32::try_from(*code) {
                Ok(code) => Validator::of_type(code),
                Err(_) => Validator::invalid(format!("type code {code} is out of range")),
            },
            ValidatorSchema::Other(json) => {
                tracing::warn!(%json, "unsupported validator shape");
                Validator::invalid(format!("unsupported validator {json}"))
            }
        }
    }
}

fn validator_schema(validator: &Validator) -> Option<ValidatorSchema> {
    match validator {
        Validator::Choices(items) => Some(ValidatorSchema::Choices(items.clone())),
        Validator::Pattern(re) => Some(ValidatorSchema::Pattern(re.as_str().to_string())),
        Validator::Type(flags) => Some(ValidatorSchema::Type(u64::from(flags.code()))),
        Validator::Function(_) | Validator::Invalid(_) => None,
    }
}

impl Program {
    /// Build a program from a manifest. Actions are attached afterwards with
    /// [`Program::command_mut`].
    pub fn from_schema(schema: &ProgramSchema) -> Result<Self, Error> {
        let mut program = Program::new()
            .with_name(schema.name.as_str())
            .with_version(schema.version.as_str())
            .with_description(schema.description.as_str());
        if let Some(bin) = &schema.bin {
            program = program.with_bin(bin.as_str());
        }
        if let Some(help) = &schema.help {
            program = program.with_help(help.as_str());
        }

        for cmd in &schema.commands {
            let command = if cmd.name == DEFAULT_COMMAND {
                program.command_mut(DEFAULT_COMMAND)?
            } else {
                program.command(&cmd.name, &cmd.description)
            };
            apply_command(command, cmd)?;
        }
        tracing::debug!(commands = schema.commands.len(), "program loaded from manifest");
        Ok(program)
    }

    /// Declaration export, with each field's static choices filled in.
    pub fn schema(&self) -> ProgramSchema {
        let mut commands: Vec<CommandSchema> =
            self.commands().iter().map(command_schema).collect();
        if let Some(fallback) = self.fallback() {
            commands.push(command_schema(fallback));
        }
        ProgramSchema {
            name: self.name().to_string(),
            version: self.version().to_string(),
            description: self.description().to_string(),
            bin: Some(self.bin().to_string()),
            help: self.help_text().map(str::to_string),
            commands,
            ..ProgramSchema::default()
        }
    }
}

fn apply_command(command: &mut Command, schema: &CommandSchema) -> Result<(), Error> {
    if let Some(alias) = &schema.alias {
        command.alias(alias);
    }
    if let Some(help) = &schema.help {
        command.help(help);
    }
    command.hidden(schema.hidden).default_command(schema.default);

    for arg in &schema.arguments {
        let mut spec = ArgSpec::new(&arg.synopsis, &arg.description)?;
        if let Some(v) = &arg.validator {
            spec = spec.with_validator(Validator::from(v));
        }
        if let Some(default) = arg.default.as_ref().and_then(Value::from_json) {
            spec = spec.with_default(default);
        }
        command.argument(spec)?;
    }
    for opt in &schema.options {
        let mut spec = OptSpec::new(&opt.synopsis, &opt.description)?.required(opt.required);
        if let Some(v) = &opt.validator {
            spec = spec.with_validator(Validator::from(v));
        }
        if let Some(default) = opt.default.as_ref().and_then(Value::from_json) {
            spec = spec.with_default(default);
        }
        command.option(spec)?;
    }
    Ok(())
}

fn command_schema(command: &Command) -> CommandSchema {
    CommandSchema {
        name: command.name().to_string(),
        alias: command.alias_name().map(str::to_string),
        description: command.description().to_string(),
        hidden: command.is_hidden(),
        default: command.is_default(),
        help: command.help_text().map(str::to_string),
        arguments: command
            .arguments()
            .iter()
            .map(|a| ArgumentSchema {
                synopsis: a.synopsis().to_string(),
                description: a.description().to_string(),
                validator: a.validator().and_then(validator_schema),
                default: a.default_value().map(Value::to_json),
                choices: a.choices(),
            })
            .collect(),
        options: command
            .options()
            .iter()
            .map(|o| OptionSchema {
                synopsis: o.synopsis().to_string(),
                description: o.description().to_string(),
                validator: o.validator().and_then(validator_schema),
                default: o.default_value().map(Value::to_json),
                required: o.is_required(),
                choices: o.choices(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::{INT, LIST};

    const MANIFEST: &str = r#"{
        "name": "pizza",
        "version": "1.0.0",
        "commands": [
            {
                "name": "order",
                "alias": "give-it-to-me",
                "arguments": [
                    { "synopsis": "<kind>", "validator": ["margherita", "hawaiian"] },
                    { "synopsis": "[count]", "validator": 1, "default": 1 }
                ],
                "options": [
                    { "synopsis": "-t, --toppings <list>", "validator": 16 },
                    { "synopsis": "--odd <x>", "validator": true }
                ]
            },
            { "name": "_default", "arguments": [{ "synopsis": "[anything...]" }] }
        ]
    }"#;

    #[test]
    fn manifests_build_programs() {
        let schema = ProgramSchema::from_json(MANIFEST).unwrap();
        let program = Program::from_schema(&schema).unwrap();
        let order = program.find_command("give-it-to-me").unwrap();
        assert_eq!(order.arguments()[0].choices(), vec!["margherita", "hawaiian"]);
        assert_eq!(order.arguments()[1].default_value(), Some(&Value::Int(1)));
        let toppings = order
            .find_option("toppings")
            .and_then(|o| o.validator())
            .and_then(Validator::type_flags);
        assert_eq!(toppings.map(|t| t.code()), Some(LIST));
        assert!(matches!(
            order.find_option("odd").and_then(|o| o.validator()),
            Some(Validator::Invalid(_))
        ));
        assert!(program.default_command().is_some());
    }

    #[test]
    fn export_round_trips_declarations() {
        let mut program = Program::new().with_name("pizza");
        program
            .command("return", "Return an order")
            .argument(ArgSpec::new("<order-id>", "").unwrap().with_validator(INT))
            .unwrap();
        let schema = program.schema();
        let ret = schema.command("return").unwrap();
        assert_eq!(ret.arguments[0].validator, Some(ValidatorSchema::Type(1)));

        let rebuilt = Program::from_schema(&schema).unwrap();
        assert_eq!(rebuilt.schema(), schema);
    }

    #[test]
    fn declaration_errors_surface_while_loading() {
        let schema = ProgramSchema::from_json(
            r#"{ "commands": [{ "name": "x", "options": [{ "synopsis": "nope" }] }] }"#,
        )
        .unwrap();
        let err = Program::from_schema(&schema).unwrap_err();
        assert_eq!(err.name(), "OptionSyntaxError");
    }
}
