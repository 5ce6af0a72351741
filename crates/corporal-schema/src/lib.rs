//! Shared declaration model for corporal programs.
//!
//! This crate intentionally does **not** depend on the runtime crate. The types
//! here mirror what a `Program` can declare except for actions and function
//! validators, and are used for:
//! - loading a program declaration from a JSON manifest
//! - exporting declarations (with static choices) to completion generators

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current manifest format version.
pub const SCHEMA_VERSION: u32 = 1;

/// A validator as it can be written in a manifest.
///
/// - `["a", "b"]` is a fixed choice set
/// - `"^\\d+$"` is a regular expression
/// - `17` is a type code (`LIST | INTEGER`)
///
/// Anything else is preserved as-is and reported when the validator is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidatorSchema {
    Choices(Vec<String>),
    Pattern(String),
    Type(u64),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentSchema {
    /// `<name>`, `[name]`, `<name...>` or `[name...]`.
    pub synopsis: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Static choices, filled in on export.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSchema {
    /// `-f, --file <file>` style synopsis.
    pub synopsis: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSchema {
    /// Space-separated command words (`config set`).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    /// Marks the program's default command.
    #[serde(default)]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSchema {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSchema>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for ProgramSchema {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            name: String::new(),
            version: String::new(),
            description: String::new(),
            bin: None,
            help: None,
            commands: Vec::new(),
        }
    }
}

impl ProgramSchema {
    pub fn from_json(contents: &str) -> Result<Self> {
        let schema: Self =
            serde_json::from_str(contents).context("failed to parse program manifest JSON")?;
        if schema.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "unsupported manifest schemaVersion {} (expected {SCHEMA_VERSION})",
                schema.schema_version
            );
        }
        Ok(schema)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("invalid manifest: {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to encode program manifest")
    }

    pub fn command(&self, name: &str) -> Option<&CommandSchema> {
        self.commands
            .iter()
            .find(|c| c.name == name || c.alias.as_deref() == Some(name))
    }
}
