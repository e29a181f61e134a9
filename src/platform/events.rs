//! Event sinks

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observability::{EventId, Logger, Severity};

/// Fire-and-forget event delivery. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, severity: Severity, id: EventId, text: &str);

    /// Emits with the event's catalogued severity
    fn report(&self, id: EventId, text: &str) {
        self.emit(id.severity(), id, text);
    }
}

/// Where a [`LogEventSink`] writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

/// Writes events as structured log lines
#[derive(Debug, Clone, Copy)]
pub struct LogEventSink {
    target: LogTarget,
    min_severity: Severity,
}

impl LogEventSink {
    pub fn new(target: LogTarget, min_severity: Severity) -> Self {
        Self {
            target,
            min_severity,
        }
    }

    /// Info and above to stderr, keeping stdout free for responses
    pub fn stderr() -> Self {
        Self::new(LogTarget::Stderr, Severity::Info)
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, severity: Severity, id: EventId, text: &str) {
        if severity < self.min_severity {
            return;
        }
        let event_id = id.id().to_string();
        let fields = [("event_id", event_id.as_str()), ("text", text)];
        match self.target {
            LogTarget::Stdout => {
                Logger::log_to_writer(severity, id.as_str(), &fields, &mut io::stdout())
            }
            LogTarget::Stderr => {
                Logger::log_to_writer(severity, id.as_str(), &fields, &mut io::stderr())
            }
        }
    }
}

/// One recorded event
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: EventId,
    pub severity: Severity,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Keeps every event in memory
///
/// Clones share the same record list.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.lock().clone()
    }

    /// Records with the given id, in emission order
    pub fn with_id(&self, id: EventId) -> Vec<EventRecord> {
        self.lock().iter().filter(|r| r.id == id).cloned().collect()
    }

    pub fn count(&self, id: EventId) -> usize {
        self.lock().iter().filter(|r| r.id == id).count()
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.count(id) > 0
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Writes every record as one JSON line
    pub fn replay<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for record in self.lock().iter() {
            serde_json::to_writer(&mut *writer, record)?;
            writeln!(writer)?;
        }
        writer.flush()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, severity: Severity, id: EventId, text: &str) {
        self.lock().push(EventRecord {
            id,
            severity,
            text: text.to_string(),
            at: Utc::now(),
        });
    }
}
