//! Framework-facing command surface
//!
//! Commands arrive as JSON objects tagged by `op` and are answered with a
//! [`CommandResponse`] carrying the result and the counters it affected.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::ChecksumApp;
use crate::domain::{ChecksumDomain, EntryRef};
use crate::fault::Fault;
use crate::observability::CounterSnapshot;
use crate::store::DefinitionEntry;

/// A command request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Noop,
    ResetCounters,
    /// Run one background cycle outside the periodic schedule
    BackgroundCheck,
    EnableAll,
    DisableAll,
    EnableDomain {
        domain: ChecksumDomain,
    },
    DisableDomain {
        domain: ChecksumDomain,
    },
    EnableEntry {
        domain: ChecksumDomain,
        entry: EntryRef,
    },
    DisableEntry {
        domain: ChecksumDomain,
        entry: EntryRef,
    },
    /// `entry` may be omitted for the single-entry domains
    ReportBaseline {
        domain: ChecksumDomain,
        #[serde(default)]
        entry: Option<EntryRef>,
    },
    Recompute {
        domain: ChecksumDomain,
        #[serde(default)]
        entry: Option<EntryRef>,
    },
    OneShot {
        address: usize,
        length: u32,
        #[serde(default)]
        max_bytes_per_cycle: u32,
    },
    CancelOneShot,
    GetEntryId {
        domain: ChecksumDomain,
        address: usize,
    },
    LoadDefinitions {
        domain: ChecksumDomain,
        entries: Vec<DefinitionEntry>,
    },
    Telemetry,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Noop => "noop",
            Command::ResetCounters => "reset_counters",
            Command::BackgroundCheck => "background_check",
            Command::EnableAll => "enable_all",
            Command::DisableAll => "disable_all",
            Command::EnableDomain { .. } => "enable_domain",
            Command::DisableDomain { .. } => "disable_domain",
            Command::EnableEntry { .. } => "enable_entry",
            Command::DisableEntry { .. } => "disable_entry",
            Command::ReportBaseline { .. } => "report_baseline",
            Command::Recompute { .. } => "recompute",
            Command::OneShot { .. } => "one_shot",
            Command::CancelOneShot => "cancel_one_shot",
            Command::GetEntryId { .. } => "get_entry_id",
            Command::LoadDefinitions { .. } => "load_definitions",
            Command::Telemetry => "telemetry",
        }
    }
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResponse {
    pub op: &'static str,
    /// "ok" or "error"
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Value,
    pub counters: CounterSnapshot,
}

impl CommandResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Executes `command` against `app`
pub fn dispatch(app: &mut ChecksumApp, command: Command) -> CommandResponse {
    let op = command.name();
    let result = execute(app, command);
    let counters = app.counters();
    match result {
        Ok(data) => CommandResponse {
            op,
            status: "ok",
            code: None,
            message: None,
            data,
            counters,
        },
        Err(fault) => CommandResponse {
            op,
            status: "error",
            code: Some(fault.code()),
            message: Some(fault.to_string()),
            data: Value::Null,
            counters,
        },
    }
}

fn execute(app: &mut ChecksumApp, command: Command) -> Result<Value, Fault> {
    let value = match command {
        Command::Noop => {
            app.noop();
            Value::Null
        }
        Command::ResetCounters => {
            app.reset_counters();
            Value::Null
        }
        Command::BackgroundCheck => {
            let outcome = app.background_cycle();
            json!({ "domain": outcome.domain(), "did_work": outcome.did_work() })
        }
        Command::EnableAll => {
            app.enable_all();
            Value::Null
        }
        Command::DisableAll => {
            app.disable_all();
            Value::Null
        }
        Command::EnableDomain { domain } => {
            app.enable_domain(domain);
            Value::Null
        }
        Command::DisableDomain { domain } => {
            app.disable_domain(domain);
            Value::Null
        }
        Command::EnableEntry { domain, entry } => {
            json!({ "index": app.enable_entry(domain, &entry)? })
        }
        Command::DisableEntry { domain, entry } => {
            json!({ "index": app.disable_entry(domain, &entry)? })
        }
        Command::ReportBaseline { domain, entry } => {
            let entry = entry.unwrap_or_else(EntryRef::implicit);
            to_value(app.report_baseline(domain, &entry)?)
        }
        Command::Recompute { domain, entry } => {
            let entry = entry.unwrap_or_else(EntryRef::implicit);
            json!({ "index": app.recompute(domain, &entry)? })
        }
        Command::OneShot {
            address,
            length,
            max_bytes_per_cycle,
        } => to_value(app.one_shot(address, length, max_bytes_per_cycle)?),
        Command::CancelOneShot => {
            app.cancel_one_shot()?;
            Value::Null
        }
        Command::GetEntryId { domain, address } => {
            json!({ "indices": app.entries_at_address(domain, address)? })
        }
        Command::LoadDefinitions { domain, entries } => {
            to_value(app.load_definitions(domain, entries)?)
        }
        Command::Telemetry => to_value(app.telemetry()),
    };
    Ok(value)
}

/// Every payload type here serializes infallibly; fall back to null anyway
fn to_value<T: Serialize>(payload: T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cmd: Command = serde_json::from_str(r#"{"op":"noop"}"#).unwrap();
        assert_eq!(cmd, Command::Noop);

        let cmd: Command =
            serde_json::from_str(r#"{"op":"disable_entry","domain":"eeprom_table","entry":3}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::DisableEntry {
                domain: ChecksumDomain::EepromTable,
                entry: EntryRef::Index(3)
            }
        );

        let cmd: Command =
            serde_json::from_str(r#"{"op":"recompute","domain":"tables_table","entry":"CS.Tbl"}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::Recompute {
                domain: ChecksumDomain::TablesTable,
                entry: Some(EntryRef::Name("CS.Tbl".into()))
            }
        );

        let cmd: Command =
            serde_json::from_str(r#"{"op":"one_shot","address":40960,"length":8}"#).unwrap();
        assert_eq!(
            cmd,
            Command::OneShot {
                address: 0xA000,
                length: 8,
                max_bytes_per_cycle: 0
            }
        );
    }

    #[test]
    fn test_report_baseline_entry_optional() {
        let cmd: Command =
            serde_json::from_str(r#"{"op":"report_baseline","domain":"cfe_core"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::ReportBaseline {
                domain: ChecksumDomain::CfeCore,
                entry: None
            }
        );
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"op":"format_disk"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"op":"enable_domain"}"#).is_err());
    }
}
