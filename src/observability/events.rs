//! Event catalogue
//!
//! Every event the checksum core emits has a fixed numeric id and a
//! symbolic name. Text is free-form and carries the entry identity.

use std::fmt;

use serde::Serialize;

use super::Severity;

/// Observable checksum events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventId {
    // Lifecycle
    /// Application initialized
    InitComplete,
    /// No-op command
    Noop,
    /// Counters reset
    ResetCounters,
    /// A full round-robin pass finished
    PassComplete,

    // Scan
    /// Background digest differs from the baseline
    Miscompare,
    /// Entry skipped this pass, resource not resolvable
    ResourceSkipped,
    /// Entry skipped this pass, collaborator failure
    ResourceError,
    /// Named resource reloaded, digest restarted
    ResourceReloaded,

    // Enable / disable
    EnableAll,
    DisableAll,
    EnableDomain,
    DisableDomain,
    EnableEntry,
    DisableEntry,
    /// No definition entry to mirror a state change into
    DefinitionNotMirrored,

    // Reports
    ReportBaseline,
    BaselineNotComputed,
    EntryLookup,
    EntryLookupMiss,

    // Worker
    RecomputeStarted,
    RecomputeFinished,
    RecomputeFailed,
    OneShotStarted,
    OneShotFinished,
    OneShotFailed,
    OneShotCancelled,

    // Commands and definitions
    /// A command was refused
    CommandRejected,
    DefinitionsValidated,
    DefinitionsRejected,
}

impl EventId {
    /// Numeric event id
    pub fn id(&self) -> u16 {
        match self {
            EventId::InitComplete => 1,
            EventId::Noop => 2,
            EventId::ResetCounters => 3,
            EventId::PassComplete => 4,
            EventId::Miscompare => 10,
            EventId::ResourceSkipped => 11,
            EventId::ResourceError => 12,
            EventId::ResourceReloaded => 13,
            EventId::EnableAll => 20,
            EventId::DisableAll => 21,
            EventId::EnableDomain => 22,
            EventId::DisableDomain => 23,
            EventId::EnableEntry => 24,
            EventId::DisableEntry => 25,
            EventId::DefinitionNotMirrored => 26,
            EventId::ReportBaseline => 30,
            EventId::BaselineNotComputed => 31,
            EventId::EntryLookup => 32,
            EventId::EntryLookupMiss => 33,
            EventId::RecomputeStarted => 40,
            EventId::RecomputeFinished => 41,
            EventId::RecomputeFailed => 42,
            EventId::OneShotStarted => 50,
            EventId::OneShotFinished => 51,
            EventId::OneShotFailed => 52,
            EventId::OneShotCancelled => 53,
            EventId::CommandRejected => 60,
            EventId::DefinitionsValidated => 70,
            EventId::DefinitionsRejected => 71,
        }
    }

    /// Symbolic name used as the log `event` field
    pub fn as_str(&self) -> &'static str {
        match self {
            EventId::InitComplete => "CS_INIT_COMPLETE",
            EventId::Noop => "CS_NOOP",
            EventId::ResetCounters => "CS_RESET_COUNTERS",
            EventId::PassComplete => "CS_PASS_COMPLETE",
            EventId::Miscompare => "CS_MISCOMPARE",
            EventId::ResourceSkipped => "CS_RESOURCE_SKIPPED",
            EventId::ResourceError => "CS_RESOURCE_ERROR",
            EventId::ResourceReloaded => "CS_RESOURCE_RELOADED",
            EventId::EnableAll => "CS_ENABLE_ALL",
            EventId::DisableAll => "CS_DISABLE_ALL",
            EventId::EnableDomain => "CS_ENABLE_DOMAIN",
            EventId::DisableDomain => "CS_DISABLE_DOMAIN",
            EventId::EnableEntry => "CS_ENABLE_ENTRY",
            EventId::DisableEntry => "CS_DISABLE_ENTRY",
            EventId::DefinitionNotMirrored => "CS_DEFINITION_NOT_MIRRORED",
            EventId::ReportBaseline => "CS_REPORT_BASELINE",
            EventId::BaselineNotComputed => "CS_BASELINE_NOT_COMPUTED",
            EventId::EntryLookup => "CS_ENTRY_LOOKUP",
            EventId::EntryLookupMiss => "CS_ENTRY_LOOKUP_MISS",
            EventId::RecomputeStarted => "CS_RECOMPUTE_STARTED",
            EventId::RecomputeFinished => "CS_RECOMPUTE_FINISHED",
            EventId::RecomputeFailed => "CS_RECOMPUTE_FAILED",
            EventId::OneShotStarted => "CS_ONESHOT_STARTED",
            EventId::OneShotFinished => "CS_ONESHOT_FINISHED",
            EventId::OneShotFailed => "CS_ONESHOT_FAILED",
            EventId::OneShotCancelled => "CS_ONESHOT_CANCELLED",
            EventId::CommandRejected => "CS_COMMAND_REJECTED",
            EventId::DefinitionsValidated => "CS_DEFINITIONS_VALIDATED",
            EventId::DefinitionsRejected => "CS_DEFINITIONS_REJECTED",
        }
    }

    /// Severity the core emits this event with
    pub fn severity(&self) -> Severity {
        match self {
            EventId::Miscompare
            | EventId::ResourceError
            | EventId::RecomputeFailed
            | EventId::OneShotFailed
            | EventId::CommandRejected
            | EventId::DefinitionsRejected => Severity::Error,

            EventId::ResetCounters
            | EventId::PassComplete
            | EventId::ResourceSkipped
            | EventId::DefinitionNotMirrored
            | EventId::RecomputeStarted
            | EventId::OneShotStarted
            | EventId::OneShotCancelled => Severity::Debug,

            _ => Severity::Info,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
