//! Worker slot state machine
//!
//! - At most one busy state at a time
//! - The main loop only moves Idle → busy
//! - The worker task only moves busy → Idle (cancellation is the one
//!   main-loop exception, and only for One-Shot)

use serde::Serialize;

use crate::domain::ChecksumDomain;
use crate::fault::Fault;
use crate::platform::TaskHandle;

/// Parameters and live progress of a One-Shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OneShotProgress {
    pub address: usize,
    pub length: u32,
    pub max_bytes_per_cycle: u32,
    pub accumulator: u32,
    pub byte_offset: u32,
}

impl OneShotProgress {
    pub fn new(address: usize, length: u32, max_bytes_per_cycle: u32) -> Self {
        Self {
            address,
            length,
            max_bytes_per_cycle,
            accumulator: 0,
            byte_offset: 0,
        }
    }
}

/// The exclusive worker slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkerSlot {
    #[default]
    Idle,
    Recomputing {
        domain: ChecksumDomain,
        entry_index: u16,
    },
    OneShot(OneShotProgress),
}

impl WorkerSlot {
    /// State name for observability
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Recomputing { .. } => "Recomputing",
            Self::OneShot(_) => "OneShot",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Entry owned by an active Recompute
    pub fn recompute_target(&self) -> Option<(ChecksumDomain, u16)> {
        match self {
            Self::Recomputing {
                domain,
                entry_index,
            } => Some((*domain, *entry_index)),
            _ => None,
        }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Idle → Recomputing
    pub fn begin_recompute(&self, domain: ChecksumDomain, entry_index: u16) -> Result<Self, Fault> {
        match self {
            Self::Idle => Ok(Self::Recomputing {
                domain,
                entry_index,
            }),
            _ => Err(Fault::WorkerBusy),
        }
    }

    /// Idle → OneShot
    pub fn begin_one_shot(&self, progress: OneShotProgress) -> Result<Self, Fault> {
        match self {
            Self::Idle => Ok(Self::OneShot(progress)),
            _ => Err(Fault::WorkerBusy),
        }
    }

    /// OneShot → Idle
    pub fn cancel_one_shot(&self) -> Result<Self, Fault> {
        match self {
            Self::OneShot(_) => Ok(Self::Idle),
            _ => Err(Fault::NothingToCancel),
        }
    }
}

/// Result of the last completed One-Shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OneShotReport {
    pub address: usize,
    pub length: u32,
    pub digest: u32,
}

/// Slot plus the bookkeeping that changes with it
#[derive(Debug, Default)]
pub struct WorkerControl {
    pub slot: WorkerSlot,
    /// Task currently bound to the slot
    pub task: Option<TaskHandle>,
    pub last_one_shot: Option<OneShotReport>,
}

impl WorkerControl {
    /// Busy → Idle, dropping the task binding
    pub fn release(&mut self) {
        self.slot = WorkerSlot::Idle;
        self.task = None;
    }
}
