//! flightcs entry point
//!
//! Parses arguments and delegates everything to the CLI module. Errors are
//! printed to stderr with a non-zero exit.

use flight_checksum::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
