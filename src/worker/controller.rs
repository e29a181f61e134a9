//! Exclusive worker controller
//!
//! Starts and cancels worker tasks on behalf of the main loop. Every start
//! claims the slot before spawning and gives it back if the spawn fails.

use std::sync::Arc;

use crate::adapter::Adapter;
use crate::app::AppCore;
use crate::domain::{ChecksumDomain, EntryRef};
use crate::fault::Fault;
use crate::platform::{TaskEntry, TaskHandle};

use super::slot::{OneShotProgress, WorkerSlot};
use super::tasks::{one_shot_child_task, recompute_child_task};

pub(crate) const RECOMPUTE_TASK_NAME: &str = "cs-recompute";
pub(crate) const ONE_SHOT_TASK_NAME: &str = "cs-oneshot";

impl AppCore {
    /// Claims the slot for a Recompute of `entry` and spawns the worker.
    ///
    /// Named entries must resolve before anything is claimed. Returns the
    /// entry's index.
    pub(crate) fn start_recompute(
        self: &Arc<Self>,
        domain: ChecksumDomain,
        entry: &EntryRef,
    ) -> Result<u16, Fault> {
        if !self.lock_worker().slot.is_idle() {
            return Err(Fault::WorkerBusy);
        }

        let (index, target) = {
            let state = self.lock_state();
            let table = state.table(domain);
            let index = table.find_index(entry)?;
            let target = table
                .result(index)
                .cloned()
                .ok_or_else(|| Fault::InvalidEntry(entry.to_string()))?;
            (index, target)
        };
        Adapter::for_domain(domain, &self.platform).probe(&target)?;

        {
            let mut worker = self.lock_worker();
            worker.slot = worker.slot.begin_recompute(domain, index)?;
        }

        let core = Arc::clone(self);
        let body: TaskEntry = Box::new(move |ctx| recompute_child_task(&core, domain, index, &ctx));
        let claim = WorkerSlot::Recomputing {
            domain,
            entry_index: index,
        };
        self.bind_or_release(claim, self.platform.tasks.spawn(RECOMPUTE_TASK_NAME, body))?;
        Ok(index)
    }

    /// Validates the range, claims the slot and spawns the One-Shot worker.
    ///
    /// A budget of 0 falls back to the configured `max_bytes_per_cycle`.
    pub(crate) fn start_one_shot(
        self: &Arc<Self>,
        address: usize,
        length: u32,
        max_bytes_per_cycle: u32,
    ) -> Result<OneShotProgress, Fault> {
        self.platform.memory.validate_range(address, length)?;

        let max_bytes_per_cycle = match max_bytes_per_cycle {
            0 => self.settings.max_bytes_per_cycle,
            max => max,
        };
        let params = OneShotProgress::new(address, length, max_bytes_per_cycle);

        {
            let mut worker = self.lock_worker();
            worker.slot = worker.slot.begin_one_shot(params)?;
            worker.last_one_shot = None;
        }

        let core = Arc::clone(self);
        let body: TaskEntry = Box::new(move |ctx| one_shot_child_task(&core, params, &ctx));
        let spawned = self.platform.tasks.spawn(ONE_SHOT_TASK_NAME, body);
        self.bind_or_release(WorkerSlot::OneShot(params), spawned)?;
        Ok(params)
    }

    /// Terminates the active One-Shot. A failed terminate leaves the slot as it was.
    pub(crate) fn cancel_one_shot(&self) -> Result<OneShotProgress, Fault> {
        let mut worker = self.lock_worker();
        let WorkerSlot::OneShot(progress) = worker.slot else {
            return Err(Fault::NothingToCancel);
        };
        let next = worker.slot.cancel_one_shot()?;
        if let Some(handle) = worker.task {
            self.platform.tasks.terminate(handle)?;
        }
        worker.slot = next;
        worker.task = None;
        Ok(progress)
    }

    /// Records the spawned task against `claim`, or hands the slot back if
    /// the spawn failed.
    fn bind_or_release(
        &self,
        claim: WorkerSlot,
        spawned: Result<TaskHandle, Fault>,
    ) -> Result<(), Fault> {
        let mut worker = self.lock_worker();
        // A fast worker may already have finished and released the slot
        let still_ours = same_claim(&worker.slot, &claim) && worker.task.is_none();
        match spawned {
            Ok(handle) => {
                if still_ours {
                    worker.task = Some(handle);
                }
                Ok(())
            }
            Err(fault) => {
                if still_ours {
                    worker.release();
                }
                Err(fault)
            }
        }
    }
}

/// One-Shot progress moves while the task runs, so compare parameters only
fn same_claim(current: &WorkerSlot, claim: &WorkerSlot) -> bool {
    match (current, claim) {
        (WorkerSlot::OneShot(a), WorkerSlot::OneShot(b)) => {
            a.address == b.address
                && a.length == b.length
                && a.max_bytes_per_cycle == b.max_bytes_per_cycle
        }
        _ => current == claim,
    }
}
