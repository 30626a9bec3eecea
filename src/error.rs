//! Error types and helpers for user-friendly error messages
//!
//! Every failure the CLI can hit maps to one [`AdvplError`] variant, and each
//! variant terminates the process with its own exit code so callers (CI jobs,
//! editor tasks) can tell them apart.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the advplcli pipeline
#[derive(Error, Debug)]
pub enum AdvplError {
    /// Unknown flag or malformed flag value
    #[error("invalid parameter: {token}")]
    InvalidArgument {
        token: String,
        reason: Option<String>,
    },

    /// Compile target is neither a file nor a directory
    #[error("Path not found or unsupported: {}", path.display())]
    PathNotFound {
        path: PathBuf,
    },

    /// Bundled archive could not be unpacked or removed
    #[error("Failed to extract {}", archive.display())]
    ArchiveExtractionFailed {
        archive: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The bridge ran but exited with a non-zero status
    #[error("{program} exited with status {exit_code}")]
    SubprocessFailure {
        program: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The bridge could not be started at all
    #[error("Failed to execute {}", program.display())]
    SubprocessLaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bundled schema or process environment is unusable
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl AdvplError {
    /// Create an invalid argument error for a token
    pub fn invalid_argument(token: impl Into<String>) -> Self {
        Self::InvalidArgument {
            token: token.into(),
            reason: None,
        }
    }

    /// Create an invalid argument error carrying the reason it was rejected
    pub fn invalid_argument_with_reason(
        token: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            token: token.into(),
            reason: Some(reason.into()),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with its underlying cause
    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Process exit code for this kind of failure
    pub fn exit_code(&self) -> u8 {
        match self {
            AdvplError::InvalidArgument { .. } => 1,
            AdvplError::PathNotFound { .. } => 2,
            AdvplError::ArchiveExtractionFailed { .. } => 3,
            AdvplError::SubprocessFailure { .. } => 4,
            AdvplError::SubprocessLaunchFailed { .. } => 5,
            AdvplError::Config { .. } => 6,
        }
    }

    /// Hint shown below the error, if any
    pub fn hint(&self) -> Option<String> {
        match self {
            AdvplError::InvalidArgument { reason, .. } => reason.clone(),
            AdvplError::PathNotFound { .. } => Some(hints::path_not_found().to_string()),
            AdvplError::ArchiveExtractionFailed { .. } => {
                Some(hints::archive_extraction().to_string())
            }
            AdvplError::SubprocessLaunchFailed { .. } => Some(hints::bridge_missing().to_string()),
            AdvplError::SubprocessFailure { .. } | AdvplError::Config { .. } => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            eprintln!("  {} {}", style("caused by:").dim(), err);
            cause = err.source();
        }

        if let AdvplError::SubprocessFailure { stdout, stderr, .. } = self {
            if !stdout.trim().is_empty() {
                eprintln!("\n{}", style("STDOUT:").cyan().bold());
                eprintln!("{}", stdout.trim_end());
            }
            if !stderr.trim().is_empty() {
                eprintln!("\n{}", style("STDERR:").cyan().bold());
                eprintln!("{}", stderr.trim_end());
            }
        }

        if let Some(h) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    /// Hint for a compile target that does not exist
    pub fn path_not_found() -> &'static str {
        "-compile expects an existing source file or a directory of sources.\n\
         Relative paths are resolved from the current directory."
    }

    /// Hint for a bridge binary that cannot be started
    pub fn bridge_missing() -> &'static str {
        "The AdvplDebugBridgeC binary is expected under bin/alpha/<platform>/\n\
         next to the advplcli installation:\n\
         • Linux: bin/alpha/linux/AdvplDebugBridgeC\n\
         • macOS: bin/alpha/mac/AdvplDebugBridgeC\n\
         • Windows: bin/alpha/win/AdvplDebugBridgeC.exe\n\
         \n\
         Reinstall the package if the directory is empty."
    }

    /// Hint for a bundled archive that failed to unpack
    pub fn archive_extraction() -> &'static str {
        "The bundled bridge archive could not be unpacked.\n\
         Check write permissions on the bin/alpha directory, or unpack it manually."
    }
}
