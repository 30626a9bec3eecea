//! Subprocess execution with captured output

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Result of a subprocess execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code (-1 when terminated by a signal)
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        let exit_code = status.code().unwrap_or(-1);
        Self {
            success: status.success(),
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }
}

/// Spawns a program and waits for it to exit
pub trait CommandRunner {
    /// Run `program` with `args`, capturing stdout and stderr.
    ///
    /// An `Err` means the process could not be started; a started process
    /// that fails is reported through [`CommandResult::success`].
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandResult>;
}

/// Runner backed by `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> io::Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        Ok(CommandResult::from_status(
            output.status,
            stdout,
            stderr,
            duration,
        ))
    }
}
