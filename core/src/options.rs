#![deny(missing_docs)]

//! # Registration Options
//!
//! The immutable configuration passed into the orchestrator, its loading from
//! JSON/YAML option files, and the published option schema.

use crate::error::{AppError, AppResult};
use crate::paths::is_absolute;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

fn default_kind() -> String {
    "component".to_string()
}

/// Options describing one unit to register.
///
/// Keys are camelCase in option files; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistrationOptions {
    /// Unit name, optionally with a directory part (`admin/side-menu`).
    pub name: String,
    /// Directory of the unit, relative to `source_directory`.
    #[serde(default)]
    pub path: String,
    /// Absolute project source directory.
    pub source_directory: String,
    /// Explicit module descriptor; auto-located when absent.
    #[serde(default, alias = "m", skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Also add the unit to the `exports` collection.
    #[serde(default)]
    pub export: bool,
    /// The unit's files live directly in `path` rather than in a folder of their own.
    #[serde(default)]
    pub flat: bool,
    /// Do not touch any module descriptor.
    #[serde(default)]
    pub skip_import: bool,
    /// Unit type; becomes the class-name suffix and file-name infix.
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
}

impl RegistrationOptions {
    /// Options with defaults for everything but `name` and `source_directory`.
    pub fn new(name: impl Into<String>, source_directory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: String::new(),
            source_directory: source_directory.into(),
            module: None,
            export: false,
            flat: false,
            skip_import: false,
            kind: default_kind(),
        }
    }

    /// Parses options from JSON.
    pub fn from_json(text: &str) -> AppResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| AppError::Config(format!("Invalid JSON options: {}", e)))
    }

    /// Parses options from YAML.
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| AppError::Config(format!("Invalid YAML options: {}", e)))
    }

    /// Loads options from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read options file {:?}: {}", path, e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Err(AppError::Config(format!(
                "Unsupported options file {:?} (expected .json, .yaml or .yml)",
                path
            ))),
        }
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Config("Option 'name' must not be empty".into()));
        }
        if self.kind.trim().is_empty() {
            return Err(AppError::Config("Option 'type' must not be empty".into()));
        }
        if !is_absolute(&self.source_directory) {
            return Err(AppError::Config(format!(
                "Option 'sourceDirectory' must be absolute, got '{}'",
                self.source_directory
            )));
        }
        Ok(())
    }
}

/// One entry of the option schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionProperty {
    /// JSON type name.
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// Human description.
    pub description: &'static str,
    /// Default value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Short alias accepted on the command line and in option files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<&'static str>,
}

/// The schema of [`RegistrationOptions`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSchema {
    /// Schema identifier.
    #[serde(rename = "$id")]
    pub id: &'static str,
    /// Title.
    pub title: &'static str,
    /// Always `object`.
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// Accepted options in declaration order.
    pub properties: IndexMap<&'static str, OptionProperty>,
    /// Options without a default.
    pub required: Vec<&'static str>,
    /// Always `false`: unknown options are rejected.
    pub additional_properties: bool,
}

/// Returns the schema enumerating every accepted option.
pub fn options_schema() -> OptionSchema {
    let mut properties: IndexMap<&'static str, OptionProperty> = IndexMap::new();
    let mut add = |name: &'static str,
                   ty: &'static str,
                   description: &'static str,
                   default: Option<Value>,
                   alias: Option<&'static str>| {
        properties.insert(
            name,
            OptionProperty {
                ty,
                description,
                default,
                alias,
            },
        );
    };

    add("name", "string", "The name of the unit to register.", None, None);
    add(
        "path",
        "string",
        "Directory of the unit, relative to the source directory.",
        Some(json!("")),
        None,
    );
    add(
        "sourceDirectory",
        "string",
        "Absolute source directory of the project.",
        None,
        None,
    );
    add(
        "module",
        "string",
        "The module descriptor to register the unit with.",
        None,
        Some("m"),
    );
    add(
        "export",
        "boolean",
        "Also export the unit from the module.",
        Some(json!(false)),
        None,
    );
    add(
        "flat",
        "boolean",
        "The unit's files live directly in the path, without a folder of their own.",
        Some(json!(false)),
        None,
    );
    add(
        "skipImport",
        "boolean",
        "Do not register the unit with any module.",
        Some(json!(false)),
        None,
    );
    add(
        "type",
        "string",
        "Unit type, used as class-name suffix and file-name infix.",
        Some(json!("component")),
        None,
    );

    OptionSchema {
        id: "modreg-registration-options",
        title: "Unit registration options",
        ty: "object",
        properties,
        required: vec!["name", "sourceDirectory"],
        additional_properties: false,
    }
}
