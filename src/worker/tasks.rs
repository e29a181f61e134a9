//! Worker task bodies
//!
//! Both run on a task from the platform scheduler, loop over chunks until
//! the range is done, and hand the slot back as their last action.

use crate::adapter::{compute_step, Adapter, RangeAdapter, StepOutcome};
use crate::app::AppCore;
use crate::domain::ChecksumDomain;
use crate::fault::Fault;
use crate::observability::EventId;
use crate::platform::TaskContext;
use crate::store::Progress;

use super::slot::{OneShotProgress, OneShotReport, WorkerSlot};

/// Full re-digest of one entry. Always rebaselines, never compares.
pub(crate) fn recompute_child_task(
    core: &AppCore,
    domain: ChecksumDomain,
    index: u16,
    ctx: &TaskContext,
) {
    let adapter = Adapter::for_domain(domain, &core.platform);
    let events = core.platform.events.as_ref();

    let identity = {
        let mut state = core.lock_state();
        match state.table_mut(domain).result_mut(index) {
            Some(entry) => {
                entry.progress.reset();
                entry.describe(domain, index)
            }
            None => format!("{} entry {}", domain.label(), index),
        }
    };

    let result = loop {
        if ctx.is_cancelled() {
            break None;
        }

        // The state lock is held for one chunk at a time
        let step = {
            let mut state = core.lock_state();
            match state.table_mut(domain).result_mut(index) {
                Some(entry) => adapter.step_entry(entry, core.settings.max_bytes_per_cycle),
                None => Err(Fault::InvalidEntry(identity.clone())),
            }
        };

        match step {
            Ok(step) => {
                if step.reloaded {
                    events.report(
                        EventId::ResourceReloaded,
                        &format!("{} reloaded during recompute, restarted", identity),
                    );
                }
                match step.outcome {
                    StepOutcome::Done(digest) => break Some(Ok(digest)),
                    StepOutcome::InProgress => core.pause(),
                }
            }
            Err(fault) => break Some(Err(fault)),
        }
    };

    match result {
        Some(Ok(digest)) => {
            if let Some(entry) = core.lock_state().table_mut(domain).result_mut(index) {
                entry.baseline = Some(digest);
                entry.progress.reset();
            }
            events.report(
                EventId::RecomputeFinished,
                &format!("{} recompute finished. New baseline is 0x{:08X}", identity, digest),
            );
        }
        Some(Err(fault)) => {
            core.counters.increment_command_errors();
            events.report(
                EventId::RecomputeFailed,
                &format!("{} recompute failed, could not get address: {}", identity, fault),
            );
        }
        None => {}
    }

    core.finish_task(ctx);
}

/// Scratch digest of an ad-hoc range; touches no entry.
pub(crate) fn one_shot_child_task(core: &AppCore, params: OneShotProgress, ctx: &TaskContext) {
    let range = RangeAdapter::new(core.platform.memory.as_ref());
    let events = core.platform.events.as_ref();
    let mut progress = Progress::default();

    let result = loop {
        if ctx.is_cancelled() {
            return;
        }
        let step = compute_step(
            &mut progress,
            params.length,
            params.max_bytes_per_cycle,
            |off, len| range.read_chunk(params.address, off, len),
        );
        match step {
            Ok(StepOutcome::Done(digest)) => break Ok(digest),
            Ok(StepOutcome::InProgress) => {
                {
                    // Cancellation is decided under this lock; once cancelled,
                    // the slot may already belong to a newer One-Shot.
                    let mut worker = core.lock_worker();
                    if ctx.is_cancelled() {
                        return;
                    }
                    if let WorkerSlot::OneShot(live) = &mut worker.slot {
                        live.byte_offset = progress.byte_offset;
                        live.accumulator = progress.partial_accumulator;
                    }
                }
                core.pause();
            }
            Err(fault) => break Err(fault),
        }
    };

    let mut worker = core.lock_worker();
    if ctx.is_cancelled() {
        return;
    }
    match result {
        Ok(digest) => {
            worker.last_one_shot = Some(OneShotReport {
                address: params.address,
                length: params.length,
                digest,
            });
            events.report(
                EventId::OneShotFinished,
                &format!(
                    "One-shot checksum on address 0x{:08X}, size {} completed. Checksum = 0x{:08X}",
                    params.address, params.length, digest
                ),
            );
        }
        Err(fault) => {
            core.counters.increment_command_errors();
            events.report(
                EventId::OneShotFailed,
                &format!(
                    "One-shot checksum on address 0x{:08X}, size {} failed: {}",
                    params.address, params.length, fault
                ),
            );
        }
    }
    worker.release();
}
