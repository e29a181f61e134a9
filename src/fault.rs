//! Fault taxonomy
//!
//! Every failure the checksum core can report. Background scanning never
//! propagates a fault upward; the command surface and the worker controller
//! return them synchronously.

use thiserror::Error;

/// Result type for checksum operations
pub type FaultResult<T> = Result<T, Fault>;

/// Checksum faults
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Bad index, name or state for a commanded operation
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// The worker slot already holds a Recompute or One-Shot
    #[error("Child task in use")]
    WorkerBusy,

    /// The external manager does not know the resource
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The platform cannot introspect the resource
    #[error("Resource address unavailable: {0}")]
    Unavailable(String),

    /// Memory validation rejected the range
    #[error("Invalid range: address {address:#010X}, length {length}")]
    InvalidRange { address: usize, length: u32 },

    /// Any other external manager failure
    #[error("Resource manager error {0:#010X}")]
    ManagerError(i32),

    /// Cancel requested with no One-Shot in progress
    #[error("No one-shot checksum in progress")]
    NothingToCancel,

    /// Task spawn or terminate failed
    #[error("Task service error: {0}")]
    Task(String),

    /// A definition table was rejected on load
    #[error("Invalid definition table: {0}")]
    InvalidDefinition(String),
}

impl Fault {
    /// Stable code string
    pub fn code(&self) -> &'static str {
        match self {
            Fault::InvalidEntry(_) => "CS_INVALID_ENTRY",
            Fault::WorkerBusy => "CS_WORKER_BUSY",
            Fault::NotFound(_) => "CS_NOT_FOUND",
            Fault::Unavailable(_) => "CS_UNAVAILABLE",
            Fault::InvalidRange { .. } => "CS_INVALID_RANGE",
            Fault::ManagerError(_) => "CS_MANAGER_ERROR",
            Fault::NothingToCancel => "CS_NOTHING_TO_CANCEL",
            Fault::Task(_) => "CS_TASK_ERROR",
            Fault::InvalidDefinition(_) => "CS_INVALID_DEFINITION",
        }
    }

    /// Faults caused by the operator's request rather than the platform
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Fault::InvalidEntry(_)
                | Fault::WorkerBusy
                | Fault::InvalidRange { .. }
                | Fault::NothingToCancel
                | Fault::InvalidDefinition(_)
        )
    }

    /// The background scan treats these as "not there this pass" and logs at
    /// debug level.
    pub fn is_transient(&self) -> bool {
        matches!(self, Fault::NotFound(_) | Fault::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let faults = [
            Fault::InvalidEntry("x".into()),
            Fault::WorkerBusy,
            Fault::NotFound("x".into()),
            Fault::Unavailable("x".into()),
            Fault::InvalidRange { address: 0, length: 0 },
            Fault::ManagerError(-1),
            Fault::NothingToCancel,
            Fault::Task("x".into()),
            Fault::InvalidDefinition("x".into()),
        ];
        let mut codes: Vec<_> = faults.iter().map(|f| f.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), faults.len());
    }

    #[test]
    fn test_classification() {
        assert!(Fault::WorkerBusy.is_user_error());
        assert!(!Fault::ManagerError(3).is_user_error());
        assert!(Fault::NotFound("t".into()).is_transient());
        assert!(Fault::Unavailable("a".into()).is_transient());
        assert!(!Fault::ManagerError(3).is_transient());
    }

    #[test]
    fn test_display_formats_range() {
        let fault = Fault::InvalidRange {
            address: 0xA000,
            length: 8,
        };
        assert_eq!(fault.to_string(), "Invalid range: address 0x0000A000, length 8");
    }
}
