//! State shared between the main loop and worker tasks

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::observability::Counters;
use crate::platform::{Platform, TaskContext};
use crate::worker::WorkerControl;

use super::state::ChecksumState;

/// Runtime tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Background budget per tick and worker chunk size; 0 = uncapped
    pub max_bytes_per_cycle: u32,
    /// Pause between worker chunks
    pub child_task_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_bytes_per_cycle: 16 * 1024,
            child_task_delay: Duration::ZERO,
        }
    }
}

/// Owned through an `Arc` by the application and by any running worker.
///
/// The two locks are never held at the same time.
pub(crate) struct AppCore {
    pub(crate) settings: Settings,
    pub(crate) platform: Platform,
    pub(crate) counters: Counters,
    state: Mutex<ChecksumState>,
    worker: Mutex<WorkerControl>,
}

impl AppCore {
    pub(crate) fn new(settings: Settings, platform: Platform, state: ChecksumState) -> Self {
        Self {
            settings,
            platform,
            counters: Counters::new(),
            state: Mutex::new(state),
            worker: Mutex::new(WorkerControl::default()),
        }
    }

    /// A worker that panicked mid-chunk leaves consistent state behind, so
    /// poisoning is ignored.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ChecksumState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_worker(&self) -> MutexGuard<'_, WorkerControl> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps between worker chunks when configured to
    pub(crate) fn pause(&self) {
        if !self.settings.child_task_delay.is_zero() {
            thread::sleep(self.settings.child_task_delay);
        }
    }

    /// Last action of every worker task. A terminated task no longer owns
    /// the slot and leaves it alone.
    pub(crate) fn finish_task(&self, ctx: &TaskContext) {
        let mut worker = self.lock_worker();
        if !ctx.is_cancelled() {
            worker.release();
        }
    }
}
