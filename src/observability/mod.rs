//! Observability
//!
//! - Structured JSON logging
//! - Command and miscompare counters
//! - The event catalogue
//!
//! Observability is read-only: nothing here feeds back into scanning.

mod events;
mod logger;
mod metrics;

pub use events::EventId;
pub use logger::{Logger, Severity};
pub use metrics::{CounterSnapshot, Counters};

/// Log an event with its default severity
pub fn log_event(event: EventId, fields: &[(&str, &str)]) {
    let severity = event.severity();
    if severity >= Severity::Error {
        Logger::log_stderr(severity, event.as_str(), fields);
    } else {
        Logger::log(severity, event.as_str(), fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(EventId::InitComplete, &[]);
        log_event(EventId::Miscompare, &[("entry", "3")]);
    }
}
