//! Configuration assembly and finalization

use std::path::{Path, MAIN_SEPARATOR};

use serde_json::{Map, Value};

use super::{value_as_string, Action, Invocation, Overrides, Schema};
use crate::error::AdvplError;

/// Root keys that only drive this process and are never sent to the bridge
const INVOCATION_KEYS: [&str; 4] = ["sources", "password", "action", "debug"];

/// Nested configuration: root options plus an `environments` sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    values: Map<String, Value>,
}

fn root_defaults(cwd: &Path) -> Map<String, Value> {
    let cwd = cwd.display().to_string();
    let mut root = Map::new();
    root.insert("workspaceFolders".into(), Value::from(cwd.clone()));
    root.insert("alpha_compile".into(), Value::from(true));
    root.insert("pathPatchBuild".into(), Value::from(cwd));
    root.insert("debug".into(), Value::from(false));
    root.insert("selectedEnvironment".into(), Value::from("environment"));
    root
}

fn environment_defaults(cwd: &Path) -> Map<String, Value> {
    let dir_with_separator =
        |name: &str| format!("{}{}", cwd.join(name).display(), MAIN_SEPARATOR);

    let mut env = Map::new();
    env.insert("smartClientPath".into(), Value::from(dir_with_separator("smartclient")));
    env.insert("includeList".into(), Value::from(dir_with_separator("includes")));
    env.insert("server".into(), Value::from("localhost"));
    env.insert("port".into(), Value::from("1234"));
    env.insert("user".into(), Value::from("admin"));
    env.insert("environment".into(), Value::from("environment"));
    env
}

fn has_active_environment(values: &Map<String, Value>) -> bool {
    values
        .get("environments")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .is_some_and(Value::is_object)
}

impl Configuration {
    /// Merge schema defaults, built-in defaults and overrides
    pub fn build(schema: &Schema, overrides: Overrides, cwd: &Path) -> Self {
        let mut values = schema.defaults();
        values.extend(root_defaults(cwd));
        values.extend(overrides.root);

        if !has_active_environment(&values) {
            values.insert(
                "environments".into(),
                Value::Array(vec![Value::Object(Map::new())]),
            );
        }

        let mut config = Self { values };
        if let Some(env) = config.active_environment_mut() {
            env.extend(environment_defaults(cwd));
            env.extend(overrides.environment);
        }
        config
    }

    /// Root-level options
    #[cfg(test)]
    pub fn root(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The environment used for this invocation
    #[cfg(test)]
    pub fn active_environment(&self) -> Option<&Map<String, Value>> {
        self.values
            .get("environments")?
            .as_array()?
            .first()?
            .as_object()
    }

    fn active_environment_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.values
            .get_mut("environments")?
            .as_array_mut()?
            .first_mut()?
            .as_object_mut()
    }

    /// Read action, source, password and debug flag from the root
    pub fn invocation(&self) -> Result<Invocation, AdvplError> {
        let action = self
            .values
            .get("action")
            .and_then(value_as_string)
            .map(|name| name.parse::<Action>())
            .transpose()?;
        let source = self.values.get("sources").and_then(value_as_string);

        if let (Some(action), None) = (action, &source) {
            return Err(AdvplError::invalid_argument_with_reason(
                format!("-{}", action),
                format!("-{} expects a path", action),
            ));
        }

        Ok(Invocation {
            action,
            source,
            password: self.values.get("password").and_then(value_as_string),
            debug: self.values.get("debug").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    /// Strip per-invocation keys and store the ciphered password
    pub fn finalize(&mut self, password_cipher: &str) -> Result<(), AdvplError> {
        for key in INVOCATION_KEYS {
            self.values.remove(key);
        }

        let env = self
            .active_environment_mut()
            .ok_or_else(|| AdvplError::config_error("No active environment in configuration"))?;

        let has_name = env
            .get("name")
            .and_then(value_as_string)
            .is_some_and(|name| !name.is_empty());
        if !has_name {
            env.remove("name");
        }

        env.insert("passwordCipher".into(), Value::from(password_cipher));
        Ok(())
    }

    /// Single-line JSON passed as `--compileInfo`
    pub fn to_compile_info(&self) -> Result<String, AdvplError> {
        serde_json::to_string(&self.values)
            .map_err(|e| AdvplError::config_error_with_source("Failed to serialize configuration", e))
    }

    /// Indented JSON for `-debug` output
    pub fn to_pretty(&self) -> Result<String, AdvplError> {
        serde_json::to_string_pretty(&self.values)
            .map_err(|e| AdvplError::config_error_with_source("Failed to serialize configuration", e))
    }
}
