//! CLI argument definitions using clap
//!
//! Commands:
//! - flightcs check --config <path>
//! - flightcs scan --config <path> --passes <n>
//! - flightcs serve --config <path> --interval-ms <ms>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flightcs - integrity scanning of memory regions, tables and applications
#[derive(Parser, Debug)]
#[command(name = "flightcs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and definition tables
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./flightcs.json")]
        config: PathBuf,
    },

    /// Run background passes and print the resulting telemetry
    Scan {
        /// Path to configuration file
        #[arg(long, default_value = "./flightcs.json")]
        config: PathBuf,

        /// Full passes to complete
        #[arg(long, default_value_t = 1)]
        passes: u32,

        /// Give up after this many ticks
        #[arg(long, default_value_t = 1_000_000)]
        max_ticks: u64,
    },

    /// Run the main loop: periodic ticks plus JSON commands on stdin
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./flightcs.json")]
        config: PathBuf,

        /// Milliseconds between background ticks
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        let cli =
            Cli::try_parse_from(["flightcs", "scan", "--config", "a.json", "--passes", "3"])
                .unwrap();
        match cli.command {
            Command::Scan {
                config,
                passes,
                max_ticks,
            } => {
                assert_eq!(config, PathBuf::from("a.json"));
                assert_eq!(passes, 3);
                assert_eq!(max_ticks, 1_000_000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["flightcs", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, interval_ms } => {
                assert_eq!(config, PathBuf::from("./flightcs.json"));
                assert_eq!(interval_ms, 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
