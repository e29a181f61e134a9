//! Checksum application
//!
//! [`ChecksumApp`] is the single owner of all checksum state. The main loop
//! drives it through `&mut self`: one background tick at a time, plus the
//! command surface. Worker tasks share the same core through an `Arc`.

mod commands;
mod shared;
mod state;
mod telemetry;

use std::sync::Arc;

pub(crate) use shared::AppCore;
pub use shared::Settings;
pub use commands::BaselineReport;
pub use state::ChecksumState;
pub use telemetry::{DomainStatus, Telemetry};

use crate::config::ChecksumConfig;
use crate::domain::{ChecksumDomain, EntryState};
use crate::fault::Fault;
use crate::observability::{CounterSnapshot, EventId};
use crate::platform::Platform;
use crate::scan::{BackgroundScanner, ScanCursor, TickOutcome};
use crate::store::{validate_definitions, DefinitionEntry, DomainTable, ResultEntry};
use crate::worker::{OneShotReport, WorkerSlot};

/// Top-level checksum controller
pub struct ChecksumApp {
    core: Arc<AppCore>,
}

impl ChecksumApp {
    /// Validates every definition table and builds the result tables.
    ///
    /// Fails with `InvalidDefinition` naming the first rejected domain.
    pub fn new(config: &ChecksumConfig, platform: Platform) -> Result<Self, Fault> {
        let events = platform.events.as_ref();

        for domain in ChecksumDomain::SCAN_ORDER {
            let definitions = config.definitions(domain);
            let report = validate_definitions(
                domain,
                &definitions,
                config.capacity(domain),
                platform.memory.as_ref(),
            );
            if !report.is_valid() {
                let message = format!("{} table: {}", domain.label(), report.errors.join("; "));
                events.report(EventId::DefinitionsRejected, &message);
                return Err(Fault::InvalidDefinition(message));
            }
            events.report(
                EventId::DefinitionsValidated,
                &format!(
                    "{} table verification results: good = {}, bad = {}, unused = {}",
                    domain.label(),
                    report.good,
                    report.bad,
                    report.unused
                ),
            );
        }

        let state = ChecksumState::new(config.checksum_enabled, |domain| {
            DomainTable::new(
                domain,
                config.capacity(domain),
                config.domain_state(domain),
                config.definitions(domain),
            )
        });

        events.report(EventId::InitComplete, "Checksum initialized");
        Ok(Self {
            core: Arc::new(AppCore::new(config.settings(), platform, state)),
        })
    }

    // =========================================================================
    // BACKGROUND SCAN
    // =========================================================================

    /// One bounded unit of background work
    pub fn background_step(&mut self) -> TickOutcome {
        self.with_scanner(|scanner| scanner.step())
    }

    /// Steps until an entry was touched or the scan wrapped
    pub fn background_cycle(&mut self) -> TickOutcome {
        self.with_scanner(|scanner| scanner.cycle())
    }

    fn with_scanner<T>(&mut self, run: impl FnOnce(&mut BackgroundScanner<'_>) -> T) -> T {
        // Only the main loop claims the slot, so this snapshot cannot go stale
        // in the direction that matters.
        let claimed = self.core.lock_worker().slot.recompute_target();
        let core = &self.core;
        let mut state = core.lock_state();
        let mut scanner = BackgroundScanner::new(
            &mut state,
            &core.platform,
            &core.counters,
            core.settings.max_bytes_per_cycle,
            claimed,
        );
        run(&mut scanner)
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    pub fn counters(&self) -> CounterSnapshot {
        self.core.counters.snapshot()
    }

    pub fn settings(&self) -> Settings {
        self.core.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.core.lock_state().checksum_enabled
    }

    pub fn domain_state(&self, domain: ChecksumDomain) -> EntryState {
        self.core.lock_state().table(domain).state()
    }

    pub fn cursor(&self) -> ScanCursor {
        self.core.lock_state().cursor
    }

    /// Copy of one result entry
    pub fn entry(&self, domain: ChecksumDomain, index: u16) -> Option<ResultEntry> {
        self.core.lock_state().table(domain).result(index).cloned()
    }

    /// Copy of one definition entry
    pub fn definition(&self, domain: ChecksumDomain, index: u16) -> Option<DefinitionEntry> {
        self.core.lock_state().table(domain).definition(index).cloned()
    }

    pub fn worker_slot(&self) -> WorkerSlot {
        self.core.lock_worker().slot
    }

    pub fn last_one_shot(&self) -> Option<OneShotReport> {
        self.core.lock_worker().last_one_shot
    }

    pub fn eeprom_aggregate(&self) -> Option<u32> {
        self.core.lock_state().eeprom_aggregate
    }
}

impl std::fmt::Debug for ChecksumApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumApp")
            .field("settings", &self.core.settings)
            .field("worker", &self.worker_slot())
            .finish()
    }
}
