//! CLI command implementations
//!
//! Every subcommand loads the configuration, builds the simulated platform
//! it describes and boots a [`ChecksumApp`] on it. Events go to stderr as
//! structured log lines; stdout carries JSON only.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::ChecksumApp;
use crate::command::dispatch;
use crate::config::ChecksumConfig;
use crate::observability::{log_event, EventId};
use crate::platform::{
    EventSink, LogEventSink, ManualScheduler, MemoryEventSink, Platform, TaskScheduler,
    ThreadScheduler,
};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{parse_command, write_command_response, write_error, write_response};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Execute a CLI command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Check { config } => check(&config),
        Command::Scan {
            config,
            passes,
            max_ticks,
        } => scan(&config, passes, max_ticks),
        Command::Serve { config, interval_ms } => serve(&config, interval_ms),
    }
}

/// Wires the configured simulation to an event sink and scheduler
pub fn build_platform(
    config: &ChecksumConfig,
    events: Arc<dyn EventSink>,
    tasks: Arc<dyn TaskScheduler>,
) -> CliResult<Platform> {
    let sim = config.platform.build()?;
    Ok(Platform {
        memory: sim.memory,
        tables: sim.tables,
        apps: sim.apps,
        events,
        tasks,
    })
}

fn boot(config_path: &Path, tasks: Arc<dyn TaskScheduler>) -> CliResult<ChecksumApp> {
    let config = ChecksumConfig::load(config_path)?;
    let platform = build_platform(&config, Arc::new(LogEventSink::stderr()), tasks)?;
    Ok(ChecksumApp::new(&config, platform)?)
}

/// Validate configuration and definition tables, then report the initial state.
///
/// Boot events are buffered and replayed to stderr whether or not the
/// definitions were accepted.
fn check(config_path: &Path) -> CliResult<()> {
    let config = ChecksumConfig::load(config_path)?;
    let events = MemoryEventSink::new();
    let platform = build_platform(
        &config,
        Arc::new(events.clone()),
        Arc::new(ManualScheduler::new()),
    )?;

    let booted = ChecksumApp::new(&config, platform);
    events.replay(&mut std::io::stderr())?;
    let app = booted?;

    let telemetry = serde_json::to_value(app.telemetry())?;
    write_response(serde_json::json!({
        "config": config_path.display().to_string(),
        "events": events.len(),
        "telemetry": telemetry,
    }))
}

/// Run background ticks until `passes` full passes complete
fn scan(config_path: &Path, passes: u32, max_ticks: u64) -> CliResult<()> {
    let mut app = boot(config_path, Arc::new(ThreadScheduler::new()))?;

    let target = app.cursor().pass_count.saturating_add(passes);
    let mut ticks: u64 = 0;
    while app.cursor().pass_count < target {
        if ticks >= max_ticks {
            return Err(CliError::scan_incomplete(format!(
                "{} of {} passes after {} ticks",
                app.cursor().pass_count,
                target,
                ticks
            )));
        }
        app.background_step();
        ticks += 1;
    }

    let telemetry = serde_json::to_value(app.telemetry())?;
    write_response(serde_json::json!({
        "ticks": ticks,
        "telemetry": telemetry,
    }))
}

/// Periodic background ticks interleaved with JSON commands from stdin.
/// Returns when stdin closes.
fn serve(config_path: &Path, interval_ms: u64) -> CliResult<()> {
    let mut app = boot(config_path, Arc::new(ThreadScheduler::new()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io_error(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(serve_loop(&mut app, Duration::from_millis(interval_ms.max(1))))
}

async fn serve_loop(app: &mut ChecksumApp, period: Duration) -> CliResult<()> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                app.background_step();
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => {
                        let response = dispatch(app, command);
                        write_command_response(&mut stdout, &response)?;
                    }
                    Err(e) => {
                        log_event(EventId::CommandRejected, &[("reason", e.message())]);
                        write_error(&mut stdout, e.code_str(), e.message())?;
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const CONFIG: &str = r#"{
        "max_bytes_per_cycle": 8,
        "cfe_core": { "state": "enabled", "start_address": 4096, "length": 32 },
        "platform": {
            "segments": [ { "base_address": 4096, "length": 64, "fill": 165 } ]
        }
    }"#;

    #[test]
    fn test_build_platform_uses_simulation() {
        let config = ChecksumConfig::from_json(CONFIG).unwrap();
        let platform = build_platform(
            &config,
            Arc::new(MemoryEventSink::new()),
            Arc::new(ManualScheduler::new()),
        )
        .unwrap();
        assert!(platform.memory.validate_range(4096, 64).is_ok());
        assert!(platform.memory.validate_range(4096, 65).is_err());
    }

    #[test]
    fn test_check_accepts_valid_config() {
        let file = write_config(CONFIG);
        assert!(check(file.path()).is_ok());
    }

    #[test]
    fn test_check_rejects_range_outside_memory() {
        let file = write_config(
            r#"{ "eeprom": { "entries": [
                { "state": "enabled", "start_address": 1, "length": 4 }
            ] } }"#,
        );
        let err = check(file.path()).unwrap_err();
        assert_eq!(err.code_str(), "CS_CLI_BOOT_FAILED");
    }

    #[test]
    fn test_scan_gives_up_after_max_ticks() {
        let file = write_config(CONFIG);
        let err = scan(file.path(), 1, 2).unwrap_err();
        assert_eq!(err.code_str(), "CS_CLI_SCAN_INCOMPLETE");
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let err = check(Path::new("/nonexistent/flightcs.json")).unwrap_err();
        assert_eq!(err.code_str(), "CS_CLI_CONFIG_ERROR");
    }
}
