//! Compile configuration handed to the bridge
//!
//! The configuration starts from the bundled schema defaults, is overlaid
//! with built-in defaults and command-line overrides, and is finally
//! serialized as the `--compileInfo` JSON argument.

pub mod args;
pub mod builder;
pub mod schema;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::AdvplError;

pub use args::{parse, Overrides, Parsed};
pub use builder::Configuration;
pub use schema::Schema;

/// Operation requested for this invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Compile a source file or directory
    Compile,
    /// Build a patch from a source list
    Patch,
    /// Apply a patch on the application server
    Apply,
}

impl Action {
    /// Name stored in the configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Compile => "compile",
            Action::Patch => "patch",
            Action::Apply => "apply",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AdvplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Action::Compile),
            "patch" => Ok(Action::Patch),
            "apply" => Ok(Action::Apply),
            other => Err(AdvplError::invalid_argument_with_reason(
                format!("--action {}", other),
                "action must be one of: compile, patch, apply",
            )),
        }
    }
}

/// Per-invocation settings read from the root of the configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    pub action: Option<Action>,
    pub source: Option<String>,
    pub password: Option<String>,
    pub debug: bool,
}

/// Render a configuration value as a plain string (`null` is absent)
pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
