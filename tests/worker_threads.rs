//! Worker tasks on real threads
//!
//! Workers pause between chunks here, so the main loop can cancel or tick
//! while a task body is in the middle of its range.

mod common;

use std::thread;
use std::time::Duration;

use common::{base_config, threaded_harness, wait_until, ThreadedHarness, HIGH_BASE, LOW_BASE};
use flight_checksum::digest;
use flight_checksum::domain::{ChecksumDomain, EntryRef, EntryState};
use flight_checksum::observability::EventId;
use flight_checksum::store::DefinitionEntry;
use flight_checksum::worker::{OneShotReport, WorkerSlot};
use flight_checksum::TickOutcome;

const TIMEOUT: Duration = Duration::from_secs(10);

/// 4-byte chunks with a 20 ms pause after each one
fn slow_harness() -> ThreadedHarness {
    let mut config = base_config();
    config.child_task_delay_ms = 20;
    threaded_harness(config)
}

fn one_shot_offset(h: &ThreadedHarness) -> u32 {
    match h.app.worker_slot() {
        WorkerSlot::OneShot(progress) => progress.byte_offset,
        _ => 0,
    }
}

// =============================================================================
// ONE-SHOT CANCELLATION
// =============================================================================

#[test]
fn test_cancelled_one_shot_never_publishes() {
    let mut h = slow_harness();
    h.app.one_shot(HIGH_BASE, 64, 4).unwrap();
    assert!(wait_until(TIMEOUT, || one_shot_offset(&h) > 0));

    h.app.cancel_one_shot().unwrap();
    assert!(h.app.worker_slot().is_idle());

    // Well past the pause the terminated task was sleeping in
    thread::sleep(Duration::from_millis(100));
    assert!(h.app.worker_slot().is_idle());
    assert_eq!(h.app.last_one_shot(), None);
    assert_eq!(h.events.count(EventId::OneShotFinished), 0);
    assert_eq!(h.events.count(EventId::OneShotCancelled), 1);
    assert_eq!(h.tasks.live_tasks(), 0);
}

#[test]
fn test_cancelled_one_shot_leaves_newer_one_alone() {
    let mut h = slow_harness();
    h.app.one_shot(HIGH_BASE, 64, 4).unwrap();
    assert!(wait_until(TIMEOUT, || one_shot_offset(&h) > 0));
    h.app.cancel_one_shot().unwrap();

    // 48 bytes at 4 per chunk cannot finish in under 220 ms
    let second = HIGH_BASE + 0x10;
    h.app.one_shot(second, 48, 4).unwrap();
    thread::sleep(Duration::from_millis(60));
    match h.app.worker_slot() {
        WorkerSlot::OneShot(progress) => {
            assert_eq!(progress.address, second);
            assert_eq!(progress.length, 48);
        }
        other => panic!("newer one-shot lost its slot: {:?}", other),
    }

    assert!(wait_until(TIMEOUT, || h.app.worker_slot().is_idle()));
    assert_eq!(
        h.app.last_one_shot(),
        Some(OneShotReport {
            address: second,
            length: 48,
            digest: digest::digest(&h.bytes(second, 48)),
        })
    );
    assert_eq!(h.events.count(EventId::OneShotFinished), 1);
}

// =============================================================================
// RECOMPUTE ALONGSIDE THE BACKGROUND SCAN
// =============================================================================

#[test]
fn test_background_ticks_skip_running_recompute_target() {
    let mut config = base_config();
    config.child_task_delay_ms = 20;
    config.eeprom.entries[3] = DefinitionEntry::range(LOW_BASE, 128, EntryState::Enabled);
    let mut h = threaded_harness(config);

    h.app.recompute(ChecksumDomain::EepromTable, &EntryRef::Index(3)).unwrap();

    let mut ticks_while_busy = 0;
    for _ in 0..100_000 {
        let outcome = h.app.background_step();
        // The slot only ever goes busy → idle on its own, so a slot still
        // busy after the tick was busy for all of it.
        if h.app.worker_slot().is_idle() {
            break;
        }
        ticks_while_busy += 1;
        assert!(
            !matches!(
                outcome,
                TickOutcome::Progressed {
                    domain: ChecksumDomain::EepromTable,
                    index: 3
                } | TickOutcome::Completed {
                    domain: ChecksumDomain::EepromTable,
                    index: 3,
                    ..
                }
            ),
            "background scan touched the recompute target"
        );
    }

    assert!(ticks_while_busy > 0);
    assert!(wait_until(TIMEOUT, || h.app.worker_slot().is_idle()));
    assert_eq!(
        h.app.entry(ChecksumDomain::EepromTable, 3).unwrap().baseline,
        Some(digest::digest(&h.bytes(LOW_BASE, 128)))
    );
    assert_eq!(h.events.count(EventId::RecomputeFinished), 1);
    assert_eq!(h.app.counters().mismatches(ChecksumDomain::EepromTable), 0);
}
