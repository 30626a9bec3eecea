//! Command-line flag scanner
//!
//! Flags are matched by suffix, so `-compile` and `--compile` are the same
//! flag, and consumed left to right in a single pass. Later flags overwrite
//! earlier ones.

use serde_json::{Map, Value};

use super::Action;
use crate::error::AdvplError;

/// Release tag sent as `serverVersion` by `-guara`
pub const GUARA_SERVER_VERSION: &str = "170117A";

/// Values collected from the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Root-level configuration keys
    pub root: Map<String, Value>,
    /// Keys for the active environment
    pub environment: Map<String, Value>,
}

impl Overrides {
    fn set_root(&mut self, key: &str, value: impl Into<Value>) {
        self.root.insert(key.to_string(), value.into());
    }

    fn set_environment(&mut self, key: &str, value: impl Into<Value>) {
        self.environment.insert(key.to_string(), value.into());
    }

    fn select_environment(&mut self, name: &str) {
        self.set_root("selectedEnvironment", name);
        self.set_environment("environment", name);
    }

    fn set_action(&mut self, action: Action, source: &str) {
        self.set_root("action", action.as_str());
        self.set_root("sources", source);
    }
}

/// Outcome of scanning the command line
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Usage text was requested
    Help,
    /// Continue with these overrides
    Run(Overrides),
}

/// Recognized flag vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag<'a> {
    Help,
    Guara,
    Environment,
    Action(Action),
    Server,
    Port,
    Include,
    Debug,
    Password,
    EnvironmentKey(&'a str),
    RootKey(&'a str),
}

fn classify(token: &str) -> Option<Flag<'_>> {
    let flag = if token.ends_with("-help") || token.ends_with("-h") || token.ends_with("/?") {
        Flag::Help
    } else if token.ends_with("-guara") {
        Flag::Guara
    } else if token.ends_with("-env") {
        Flag::Environment
    } else if token.ends_with("-compile") {
        Flag::Action(Action::Compile)
    } else if token.ends_with("-patch") {
        Flag::Action(Action::Patch)
    } else if token.ends_with("-apply") {
        Flag::Action(Action::Apply)
    } else if token.ends_with("-server") {
        Flag::Server
    } else if token.ends_with("-port") {
        Flag::Port
    } else if token.ends_with("-include") {
        Flag::Include
    } else if token.ends_with("-debug") {
        Flag::Debug
    } else if token.ends_with("-password") {
        Flag::Password
    } else if token.ends_with("--env.environment") || token.ends_with("--selectedEnvironment") {
        Flag::Environment
    } else if let Some(key) = token.strip_prefix("--env.") {
        Flag::EnvironmentKey(key)
    } else if let Some(key) = token.strip_prefix("--") {
        Flag::RootKey(key)
    } else {
        return None;
    };
    Some(flag)
}

fn take_value<'a, I>(flag: &str, tokens: &mut I) -> Result<&'a str, AdvplError>
where
    I: Iterator<Item = &'a String>,
{
    tokens.next().map(String::as_str).ok_or_else(|| {
        AdvplError::invalid_argument_with_reason(flag, format!("{} expects a value", flag))
    })
}

/// Scan the command line (program name excluded)
pub fn parse(tokens: &[String]) -> Result<Parsed, AdvplError> {
    let mut overrides = Overrides::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        let flag = classify(token).ok_or_else(|| AdvplError::invalid_argument(token.as_str()))?;

        match flag {
            Flag::Help => return Ok(Parsed::Help),
            Flag::Guara => overrides.set_environment("serverVersion", GUARA_SERVER_VERSION),
            Flag::Environment => {
                let name = take_value(token, &mut iter)?;
                overrides.select_environment(name);
            }
            Flag::Action(action) => {
                let source = take_value(token, &mut iter)?;
                overrides.set_action(action, source);
            }
            Flag::Server => {
                let host = take_value(token, &mut iter)?;
                overrides.set_environment("server", host);
            }
            Flag::Port => {
                let port = take_value(token, &mut iter)?;
                if port.parse::<u16>().is_err() {
                    return Err(AdvplError::invalid_argument_with_reason(
                        format!("{} {}", token, port),
                        "port must be a number between 0 and 65535",
                    ));
                }
                overrides.set_environment("port", port);
            }
            Flag::Include => {
                let path = take_value(token, &mut iter)?;
                overrides.set_environment("includeList", path);
            }
            Flag::Debug => overrides.set_root("debug", true),
            Flag::Password => {
                let password = take_value(token, &mut iter)?;
                overrides.set_root("password", password);
            }
            Flag::EnvironmentKey(key) | Flag::RootKey(key) if key.is_empty() => {
                return Err(AdvplError::invalid_argument_with_reason(
                    token.as_str(),
                    "parameter name is empty",
                ));
            }
            Flag::EnvironmentKey(key) => {
                let value = take_value(token, &mut iter)?;
                overrides.set_environment(key, value);
            }
            Flag::RootKey(key) => {
                let value = take_value(token, &mut iter)?;
                overrides.set_root(key, value);
            }
        }
    }

    Ok(Parsed::Run(overrides))
}
