//! Command-line front end
//!
//! `flightcs check` validates a configuration, `flightcs scan` runs passes
//! to completion and `flightcs serve` runs the periodic main loop with JSON
//! commands on stdin.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build_platform, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_command, write_command_response, write_error, write_line, write_response};
