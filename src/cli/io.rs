//! JSON-lines I/O for the CLI
//!
//! - One JSON object per line, UTF-8 only
//! - Responses and reports go to stdout; events and logs go to stderr

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::command::{Command, CommandResponse};

use super::errors::{CliError, CliResult};

/// Parses one request line
pub fn parse_command(line: &str) -> CliResult<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CliError::io_error("Empty line"));
    }
    Ok(serde_json::from_str(line)?)
}

/// Writes any serializable value as one line
pub fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&mut io::stdout(), &response)
}

/// Write an error response to stdout
pub fn write_error<W: Write>(writer: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(writer, &response)
}

/// Write a command response
pub fn write_command_response<W: Write>(
    writer: &mut W,
    response: &CommandResponse,
) -> CliResult<()> {
    write_line(writer, response)
}
