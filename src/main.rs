//! advplcli - command-line front end for the AdvPL debug bridge
//!
//! Translates command-line flags into the JSON configuration understood by
//! the bundled `AdvplDebugBridgeC` executable and relays its output.
//!
//! ## Flow
//!
//! ```text
//! unpack bundled archives → parse flags → build configuration
//!     → cipher password (bridge) → compile | patch | apply (bridge)
//! ```

mod archive;
mod cli;
mod config;
mod error;
mod exec;
mod utils;

use std::process::ExitCode;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::from_args(std::env::args_os());
    cli.execute()
}
