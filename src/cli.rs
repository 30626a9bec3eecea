//! CLI entry point and the compile pipeline
//!
//! clap only collects the raw tokens; the advplcli flag vocabulary (`-compile`,
//! `--env.server`, `/?`, ...) does not follow clap conventions and is scanned
//! by [`crate::config::parse`].

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use indicatif::ProgressBar;

use crate::archive::{self, NativeUnpacker};
use crate::config::{parse, Configuration, Invocation, Parsed, Schema};
use crate::error::AdvplError;
use crate::exec::{Bridge, CommandRunner, Request, SystemRunner};
use crate::utils::paths::{self, BridgeLayout};
use crate::utils::terminal::{create_spinner, print_error, print_info, print_warning};

const USAGE: &str = "
advplcli
========

Compiles AdvPL sources from the command line through the AdvPL debug bridge.

parameters
----------

    general:
    -help       Show this help
    -debug      Print the configuration sent to the bridge
    --param     Add/override a compile parameter
    --env.param Add/override a compile parameter in the environments section

    actions:
    -compile    Compile a source file or a directory
    -patch      Build a patch from the sources in a list file
    -apply      Apply a patch to the repository on the application server

    shortcuts:
    -server     Shortcut for --env.server
    -port       Shortcut for --env.port
    -guara      Shortcut for --env.serverVersion 170117A
    -env        Shortcut for --env.environment and --selectedEnvironment
    -include    Shortcut for --env.includeList
    -password   Password, ciphered by the bridge

examples
--------

show the default parameters
$ advplcli -debug

compile sources (includes in ${PWD}/includes):
$ advplcli -server example.com -port 1234 -compile ${PWD}/src

compile sources on a 17.1.17 (guara) server:
$ advplcli -server example.com -port 1234 -compile ${PWD}/src -guara

build a patch (ptm written to ${PWD}):
$ advplcli -patch list.txt

apply a patch:
$ advplcli -apply tttp120.ptm
";

/// advplcli - command-line front end for the AdvPL debug bridge
#[derive(Parser, Debug)]
#[command(name = "advplcli")]
#[command(about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// advplcli flags, see -help
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 1..)]
    pub tokens: Vec<String>,
}

impl Cli {
    /// Parse `argv`, keeping every token after the program name verbatim.
    ///
    /// clap swallows a leading `--` as its end-of-options marker, which the
    /// scanner must reject, so the tokens come from `argv` itself.
    pub fn from_args<I, T>(argv: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let mut cli = Self::parse_from(&argv);
        cli.tokens = argv
            .iter()
            .skip(1)
            .map(|token| token.to_string_lossy().into_owned())
            .collect();
        cli
    }

    /// Execute the CLI and map the outcome to a process exit code
    pub fn execute(self) -> ExitCode {
        match self.run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err @ AdvplError::InvalidArgument { .. }) => {
                print_error(&err.to_string());
                if let Some(hint) = err.hint() {
                    eprintln!("  {}", hint);
                }
                print_usage();
                ExitCode::from(err.exit_code())
            }
            Err(err) => {
                err.display_with_hints();
                ExitCode::from(err.exit_code())
            }
        }
    }

    fn run(self) -> Result<(), AdvplError> {
        let layout = BridgeLayout::discover()
            .map_err(|e| AdvplError::config_error_with_source("Failed to locate the bridge", e))?;
        prepare_bridge(&layout)?;

        let overrides = match parse(&self.tokens)? {
            Parsed::Help => {
                print_usage();
                return Ok(());
            }
            Parsed::Run(overrides) => overrides,
        };

        let cwd = paths::current_dir()
            .map_err(|e| AdvplError::config_error_with_source("Failed to read working directory", e))?;
        let config = Configuration::build(&Schema::bundled()?, overrides, &cwd);
        let invocation = config.invocation()?;
        let bridge = Bridge::new(layout.bridge, SystemRunner).with_debug(invocation.debug);

        run_pipeline(&bridge, config, &invocation, &mut io::stdout())
    }
}

fn print_usage() {
    println!("{}", USAGE);
}

/// Unpack bundled bridge archives before anything else runs
fn prepare_bridge(layout: &BridgeLayout) -> Result<(), AdvplError> {
    let Some(dir) = layout.platform_dir.as_deref() else {
        print_warning("Unsupported platform, no bundled bridge is available");
        return Ok(());
    };

    let report = archive::extract(dir, &NativeUnpacker)?;
    if !report.extracted.is_empty() {
        print_info(&format!(
            "Unpacked {} bridge archive(s) in {}",
            report.extracted.len(),
            dir.display()
        ));
    }
    Ok(())
}

/// Cipher the password, finalize the configuration and run the action.
///
/// The compile target is validated before the first bridge call. The
/// `-debug` configuration dump and the action's stdout go to `out`.
pub fn run_pipeline<R: CommandRunner, W: Write>(
    bridge: &Bridge<R>,
    mut config: Configuration,
    invocation: &Invocation,
    out: &mut W,
) -> Result<(), AdvplError> {
    let request = match (invocation.action, invocation.source.as_deref()) {
        (Some(action), Some(source)) => Some(Request::resolve(action, source)?),
        _ => None,
    };

    let cipher = bridge.cipher(invocation.password.as_deref())?;
    config.finalize(&cipher)?;

    if invocation.debug {
        write_output(out, &config.to_pretty()?)?;
    }

    let Some(request) = request else {
        return Ok(());
    };

    let spinner = action_spinner(&request, invocation.debug);
    let result = bridge.execute(&request, &config);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    write_output(out, &result?)
}

/// Spinner shown while the action runs; none with `-debug`, whose
/// bridge echo is written to the same stderr
fn action_spinner(request: &Request, debug: bool) -> Option<ProgressBar> {
    (!debug).then(|| {
        create_spinner(&format!(
            "Running {} on {}",
            request.action(),
            request.source()
        ))
    })
}

fn write_output<W: Write>(out: &mut W, text: &str) -> Result<(), AdvplError> {
    writeln!(out, "{}", text)
        .map_err(|e| AdvplError::config_error_with_source("Failed to write output", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;
    use crate::exec::subprocess::fake::RecordingRunner;
    use std::path::Path;
    use tempfile::TempDir;

    fn prepare(tokens: &[&str]) -> (Configuration, Invocation) {
        let tokens: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        let overrides = match parse(&tokens).unwrap() {
            Parsed::Run(overrides) => overrides,
            Parsed::Help => Overrides::default(),
        };
        let config = Configuration::build(&Schema::bundled().unwrap(), overrides, Path::new("/work"));
        let invocation = config.invocation().unwrap();
        (config, invocation)
    }

    fn bridge(runner: RecordingRunner) -> Bridge<RecordingRunner> {
        Bridge::new("AdvplDebugBridgeC", runner)
    }

    /// Run the pipeline, returning what it printed to stdout
    fn run(
        bridge: &Bridge<RecordingRunner>,
        config: Configuration,
        invocation: &Invocation,
    ) -> Result<String, AdvplError> {
        let mut out = Vec::new();
        run_pipeline(bridge, config, invocation, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn compile_info(call: &[String]) -> serde_json::Value {
        let info = call
            .iter()
            .find_map(|arg| arg.strip_prefix("--compileInfo="))
            .unwrap();
        serde_json::from_str(info).unwrap()
    }

    #[test]
    fn test_compile_directory_pipeline() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().to_string_lossy().to_string();
        let (config, invocation) = prepare(&["-compile", source.as_str(), "-password", "secret"]);

        let bridge = bridge(RecordingRunner::succeeding("OK"));
        let output = run(&bridge, config, &invocation).unwrap();
        assert_eq!(output, "OK\n");

        let calls = bridge_calls(&bridge);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec!["--CipherPassword=secret".to_string()]);
        assert_eq!(calls[1][0], "--compileType=1");
        assert_eq!(calls[1][2], format!("--source={}", source));

        let info = compile_info(&calls[1]);
        assert_eq!(info["environments"][0]["passwordCipher"], "OK");
        for key in ["sources", "password", "action", "debug"] {
            assert!(info.get(key).is_none(), "{}", key);
        }
    }

    #[test]
    fn test_missing_compile_target_spawns_nothing() {
        let (config, invocation) = prepare(&["-compile", "/nonexistent/advpl/src"]);
        let bridge = bridge(RecordingRunner::succeeding(""));

        let err = run(&bridge, config, &invocation).unwrap_err();
        assert!(matches!(err, AdvplError::PathNotFound { .. }));
        assert!(bridge_calls(&bridge).is_empty());
    }

    #[test]
    fn test_patch_without_password_uses_empty_cipher() {
        let (config, invocation) = prepare(&["-patch", "list.txt", "-guara"]);
        let bridge = bridge(RecordingRunner::succeeding("done"));
        run(&bridge, config, &invocation).unwrap();

        let calls = bridge_calls(&bridge);
        assert_eq!(calls[0], vec!["--CipherPasswordEmpty".to_string()]);
        assert_eq!(calls[1][1], "--patchBuild=list.txt");
        assert_eq!(compile_info(&calls[1])["environments"][0]["serverVersion"], "170117A");
    }

    #[test]
    fn test_no_action_only_ciphers() {
        let (config, invocation) = prepare(&["-server", "example.com"]);
        let bridge = bridge(RecordingRunner::succeeding("cipher"));

        assert_eq!(run(&bridge, config, &invocation).unwrap(), "");
        assert_eq!(bridge_calls(&bridge).len(), 1);
    }

    #[test]
    fn test_cipher_failure_stops_pipeline() {
        let (config, invocation) = prepare(&["-apply", "tttp120.ptm"]);
        let bridge = bridge(RecordingRunner::failing(1, "", "bad password"));

        let err = run(&bridge, config, &invocation).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(bridge_calls(&bridge).len(), 1);
    }

    #[test]
    fn test_debug_prints_finalized_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().to_string_lossy().to_string();
        let (config, invocation) =
            prepare(&["-compile", source.as_str(), "-password", "secret", "-debug"]);
        let bridge = bridge(RecordingRunner::succeeding("CIPHERED"));

        let output = run(&bridge, config, &invocation).unwrap();
        let (dump, action_output) = output.rsplit_once("}\n").unwrap();
        assert_eq!(action_output, "CIPHERED\n");

        let printed: serde_json::Value = serde_json::from_str(&format!("{}}}", dump)).unwrap();
        for key in ["sources", "password", "action", "debug"] {
            assert!(printed.get(key).is_none(), "{}", key);
        }
        assert_eq!(printed["environments"][0]["passwordCipher"], "CIPHERED");
        assert_eq!(printed, compile_info(&bridge_calls(&bridge)[1]));
        assert!(!output.contains("secret"));
    }

    #[test]
    fn test_debug_without_action_prints_configuration_only() {
        let (config, invocation) = prepare(&["-debug"]);
        let bridge = bridge(RecordingRunner::succeeding("CIPHER"));

        let output = run(&bridge, config, &invocation).unwrap();
        let printed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(printed["environments"][0]["passwordCipher"], "CIPHER");
        assert!(printed.get("debug").is_none());
    }

    #[test]
    fn test_no_spinner_under_debug() {
        let request = Request::resolve(crate::config::Action::Patch, "list.txt").unwrap();
        assert!(action_spinner(&request, true).is_none());

        let spinner = action_spinner(&request, false).unwrap();
        spinner.finish_and_clear();
    }

    #[test]
    fn test_cli_collects_raw_tokens() {
        let cli = Cli::from_args(["advplcli", "-compile", "src", "--env.server", "h", "/?"]);
        assert_eq!(cli.tokens, ["-compile", "src", "--env.server", "h", "/?"]);

        let cli = Cli::from_args(["advplcli", "-h"]);
        assert_eq!(cli.tokens, ["-h"]);

        let cli = Cli::from_args(["advplcli"]);
        assert!(cli.tokens.is_empty());
    }

    #[test]
    fn test_cli_keeps_double_dash() {
        let cli = Cli::from_args(["advplcli", "--"]);
        assert_eq!(cli.tokens, ["--"]);
        assert!(parse(&cli.tokens).is_err());

        let cli = Cli::from_args(["advplcli", "--", "-compile", "/tmp"]);
        assert_eq!(cli.tokens, ["--", "-compile", "/tmp"]);
        assert!(matches!(
            parse(&cli.tokens),
            Err(AdvplError::InvalidArgument { .. })
        ));
    }

    fn bridge_calls(bridge: &Bridge<RecordingRunner>) -> Vec<Vec<String>> {
        bridge.runner().calls()
    }
}
