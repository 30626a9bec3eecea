//! Invocation of the AdvplDebugBridgeC executable
//!
//! Every operation is exactly one bridge process:
//!
//! ```text
//! cipher   <bridge> --CipherPassword=<pw> | --CipherPasswordEmpty
//! compile  <bridge> --compileType=<0|1> --compileInfo=<json> --source=<path>
//! patch    <bridge> --compileInfo=<json> --patchBuild=<path>
//! apply    <bridge> --compileInfo=<json> --patchApply=<path>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::subprocess::CommandRunner;
use crate::config::{Action, Configuration};
use crate::error::AdvplError;
use crate::utils::terminal::print_verbose;

const CIPHER_PASSWORD_FLAG: &str = "--CipherPassword=";
const CIPHER_PASSWORD_EMPTY_FLAG: &str = "--CipherPasswordEmpty";

/// Kind of path handed to `-compile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileTarget {
    File,
    Directory,
}

impl CompileTarget {
    /// Classify `path`, failing if it is neither a file nor a directory
    pub fn resolve(path: &Path) -> Result<Self, AdvplError> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(CompileTarget::File),
            Ok(meta) if meta.is_dir() => Ok(CompileTarget::Directory),
            _ => Err(AdvplError::PathNotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Value of `--compileType`
    pub fn compile_type(&self) -> u8 {
        match self {
            CompileTarget::File => 0,
            CompileTarget::Directory => 1,
        }
    }
}

/// A validated action ready to be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Compile { source: String },
    Patch { source: String },
    Apply { source: String },
}

impl Request {
    /// Validate an action and its source before anything is spawned
    pub fn resolve(action: Action, source: &str) -> Result<Self, AdvplError> {
        let source = source.to_string();
        Ok(match action {
            Action::Compile => {
                CompileTarget::resolve(Path::new(&source))?;
                Request::Compile { source }
            }
            Action::Patch => Request::Patch { source },
            Action::Apply => Request::Apply { source },
        })
    }

    pub fn action(&self) -> Action {
        match self {
            Request::Compile { .. } => Action::Compile,
            Request::Patch { .. } => Action::Patch,
            Request::Apply { .. } => Action::Apply,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Request::Compile { source } | Request::Patch { source } | Request::Apply { source } => source,
        }
    }
}

/// Handle on the bridge executable
#[derive(Debug)]
pub struct Bridge<R> {
    program: PathBuf,
    runner: R,
    debug: bool,
}

impl<R: CommandRunner> Bridge<R> {
    pub fn new(program: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
            debug: false,
        }
    }

    /// Echo every bridge command line before running it
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// Cipher a password; an absent or empty password uses the empty form
    pub fn cipher(&self, password: Option<&str>) -> Result<String, AdvplError> {
        let arg = match password {
            Some(password) if !password.is_empty() => format!("{}{}", CIPHER_PASSWORD_FLAG, password),
            _ => CIPHER_PASSWORD_EMPTY_FLAG.to_string(),
        };
        self.invoke(vec![arg])
    }

    /// Compile a source file or every source in a directory
    pub fn compile(&self, source: &str, config: &Configuration) -> Result<String, AdvplError> {
        let target = CompileTarget::resolve(Path::new(source))?;
        self.invoke(vec![
            format!("--compileType={}", target.compile_type()),
            format!("--compileInfo={}", config.to_compile_info()?),
            format!("--source={}", source),
        ])
    }

    /// Build a patch from a source list
    pub fn patch(&self, source: &str, config: &Configuration) -> Result<String, AdvplError> {
        self.invoke(vec![
            format!("--compileInfo={}", config.to_compile_info()?),
            format!("--patchBuild={}", source),
        ])
    }

    /// Apply a patch file on the application server
    pub fn apply(&self, source: &str, config: &Configuration) -> Result<String, AdvplError> {
        self.invoke(vec![
            format!("--compileInfo={}", config.to_compile_info()?),
            format!("--patchApply={}", source),
        ])
    }

    /// Dispatch a validated request
    pub fn execute(&self, request: &Request, config: &Configuration) -> Result<String, AdvplError> {
        match request {
            Request::Compile { source } => self.compile(source, config),
            Request::Patch { source } => self.patch(source, config),
            Request::Apply { source } => self.apply(source, config),
        }
    }

    fn invoke(&self, args: Vec<String>) -> Result<String, AdvplError> {
        print_verbose(
            self.debug,
            &format!("Executing: {} {}", self.program.display(), masked(&args).join(" ")),
        );

        let result = self.runner.run(&self.program, &args).map_err(|source| {
            AdvplError::SubprocessLaunchFailed {
                program: self.program.clone(),
                source,
            }
        })?;

        print_verbose(
            self.debug,
            &format!("Bridge exited with {} after {:.2?}", result.exit_code, result.duration),
        );

        if !result.success {
            return Err(AdvplError::SubprocessFailure {
                program: self
                    .program
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| self.program.display().to_string()),
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        Ok(result.stdout)
    }
}

fn masked(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if arg.starts_with(CIPHER_PASSWORD_FLAG) {
                format!("{}****", CIPHER_PASSWORD_FLAG)
            } else {
                arg.clone()
            }
        })
        .collect()
}
