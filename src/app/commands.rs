//! Command surface
//!
//! Every command either succeeds (command counter +1) or fails with a typed
//! fault (command-error counter +1, error event, no state change).

use serde::Serialize;

use crate::domain::{ChecksumDomain, EntryRef, EntryState};
use crate::fault::Fault;
use crate::observability::EventId;
use crate::store::{validate_definitions, DefinitionEntry, ValidationReport};
use crate::worker::OneShotProgress;

use super::ChecksumApp;

/// Answer to a baseline report request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BaselineReport {
    Computed { baseline: u32 },
    NotYetComputed,
}

impl ChecksumApp {
    fn accept(&self, id: EventId, text: &str) {
        self.core.counters.increment_commands();
        self.core.platform.events.report(id, text);
    }

    fn reject<T>(&self, command: &str, fault: Fault) -> Result<T, Fault> {
        self.core.counters.increment_command_errors();
        self.core
            .platform
            .events
            .report(EventId::CommandRejected, &format!("{} rejected: {}", command, fault));
        Err(fault)
    }

    // =========================================================================
    // HOUSEKEEPING
    // =========================================================================

    pub fn noop(&mut self) {
        self.accept(
            EventId::Noop,
            &format!("No-op command. Version {}", env!("CARGO_PKG_VERSION")),
        );
    }

    /// Zeroes every counter and the pass count
    pub fn reset_counters(&mut self) {
        self.core.counters.reset();
        self.core.lock_state().cursor.pass_count = 0;
        self.core
            .platform
            .events
            .report(EventId::ResetCounters, "Reset counters command received");
    }

    // =========================================================================
    // ENABLE / DISABLE
    // =========================================================================

    pub fn enable_all(&mut self) {
        self.core.lock_state().checksum_enabled = true;
        self.accept(EventId::EnableAll, "Checksumming of all areas is enabled");
    }

    /// Also zeroes in-flight progress everywhere
    pub fn disable_all(&mut self) {
        {
            let mut state = self.core.lock_state();
            state.checksum_enabled = false;
            state.reset_all_progress();
        }
        self.accept(EventId::DisableAll, "Checksumming of all areas is disabled");
    }

    pub fn enable_domain(&mut self, domain: ChecksumDomain) {
        self.core
            .lock_state()
            .table_mut(domain)
            .set_state(EntryState::Enabled);
        self.accept(
            EventId::EnableDomain,
            &format!("Checksumming of {} is enabled", domain.label()),
        );
    }

    /// Also zeroes in-flight progress of the domain's entries
    pub fn disable_domain(&mut self, domain: ChecksumDomain) {
        {
            let mut state = self.core.lock_state();
            let table = state.table_mut(domain);
            table.set_state(EntryState::Disabled);
            table.reset_progress();
        }
        self.accept(
            EventId::DisableDomain,
            &format!("Checksumming of {} is disabled", domain.label()),
        );
    }

    pub fn enable_entry(&mut self, domain: ChecksumDomain, entry: &EntryRef) -> Result<u16, Fault> {
        self.set_entry_state(domain, entry, EntryState::Enabled)
    }

    /// Disabling discards the entry's in-flight progress
    pub fn disable_entry(
        &mut self,
        domain: ChecksumDomain,
        entry: &EntryRef,
    ) -> Result<u16, Fault> {
        self.set_entry_state(domain, entry, EntryState::Disabled)
    }

    fn set_entry_state(
        &mut self,
        domain: ChecksumDomain,
        entry: &EntryRef,
        new_state: EntryState,
    ) -> Result<u16, Fault> {
        let (command, id) = match new_state {
            EntryState::Enabled => ("Enable entry", EventId::EnableEntry),
            _ => ("Disable entry", EventId::DisableEntry),
        };

        let changed = {
            let mut state = self.core.lock_state();
            let table = state.table_mut(domain);
            table.find_index(entry).map(|index| {
                let identity = match table.result_mut(index) {
                    Some(result) => {
                        if new_state == EntryState::Enabled {
                            result.enable();
                        } else {
                            result.disable();
                        }
                        result.describe(domain, index)
                    }
                    None => entry.to_string(),
                };
                let mirrored = table.mirror_definition_state(index, new_state);
                (index, identity, mirrored)
            })
        };

        match changed {
            Ok((index, identity, mirrored)) => {
                if !mirrored {
                    self.core.platform.events.report(
                        EventId::DefinitionNotMirrored,
                        &format!("{}: no matching definition entry to update", identity),
                    );
                }
                self.accept(id, &format!("Checksumming of {} is {}", identity, new_state));
                Ok(index)
            }
            Err(fault) => self.reject(command, fault),
        }
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    /// Stored baseline of an entry. Never computes anything.
    pub fn report_baseline(
        &mut self,
        domain: ChecksumDomain,
        entry: &EntryRef,
    ) -> Result<BaselineReport, Fault> {
        let found = {
            let state = self.core.lock_state();
            let table = state.table(domain);
            table.find_index(entry).map(|index| {
                let result = table.result(index);
                (
                    result.map_or_else(|| entry.to_string(), |r| r.describe(domain, index)),
                    result.and_then(|r| r.baseline),
                )
            })
        };

        match found {
            Ok((identity, Some(baseline))) => {
                self.accept(
                    EventId::ReportBaseline,
                    &format!("Report baseline of {} is 0x{:08X}", identity, baseline),
                );
                Ok(BaselineReport::Computed { baseline })
            }
            Ok((identity, None)) => {
                self.accept(
                    EventId::BaselineNotComputed,
                    &format!("Report baseline of {} has not been computed yet", identity),
                );
                Ok(BaselineReport::NotYetComputed)
            }
            Err(fault) => self.reject("Report baseline", fault),
        }
    }

    /// Every entry of a range domain whose range covers `address`
    pub fn entries_at_address(
        &mut self,
        domain: ChecksumDomain,
        address: usize,
    ) -> Result<Vec<u16>, Fault> {
        if domain.is_named() {
            return self.reject(
                "Get entry ID",
                Fault::InvalidEntry(format!("{} entries have no fixed address", domain.label())),
            );
        }

        let indices = self.core.lock_state().table(domain).entries_containing(address);
        if indices.is_empty() {
            self.accept(
                EventId::EntryLookupMiss,
                &format!("Address 0x{:08X} was not found in {} table", address, domain.label()),
            );
        } else {
            self.accept(
                EventId::EntryLookup,
                &format!(
                    "{} entries containing address 0x{:08X}: {:?}",
                    domain.label(),
                    address,
                    indices
                ),
            );
        }
        Ok(indices)
    }

    // =========================================================================
    // WORKER
    // =========================================================================

    /// Starts a Recompute of one entry on a worker task
    pub fn recompute(&mut self, domain: ChecksumDomain, entry: &EntryRef) -> Result<u16, Fault> {
        match self.core.start_recompute(domain, entry) {
            Ok(index) => {
                self.accept(
                    EventId::RecomputeStarted,
                    &format!("Recompute baseline of {} {} started", domain.label(), entry),
                );
                Ok(index)
            }
            Err(fault) => self.reject("Recompute", fault),
        }
    }

    /// Starts a One-Shot over `[address, address + length)`
    pub fn one_shot(
        &mut self,
        address: usize,
        length: u32,
        max_bytes_per_cycle: u32,
    ) -> Result<OneShotProgress, Fault> {
        match self.core.start_one_shot(address, length, max_bytes_per_cycle) {
            Ok(params) => {
                self.accept(
                    EventId::OneShotStarted,
                    &format!(
                        "One-shot checksum started on address 0x{:08X}, size {}",
                        address, length
                    ),
                );
                Ok(params)
            }
            Err(fault) => self.reject("One-shot", fault),
        }
    }

    pub fn cancel_one_shot(&mut self) -> Result<(), Fault> {
        match self.core.cancel_one_shot() {
            Ok(progress) => {
                self.accept(
                    EventId::OneShotCancelled,
                    &format!(
                        "One-shot checksum on address 0x{:08X} cancelled after {} bytes",
                        progress.address, progress.byte_offset
                    ),
                );
                Ok(())
            }
            Err(fault) => self.reject("Cancel one-shot", fault),
        }
    }

    // =========================================================================
    // DEFINITIONS
    // =========================================================================

    /// Validates and installs a new definition table for `domain`.
    ///
    /// Rebuilds every result entry of the domain; baselines start over.
    /// Refused while a Recompute owns an entry of the domain.
    pub fn load_definitions(
        &mut self,
        domain: ChecksumDomain,
        definitions: Vec<DefinitionEntry>,
    ) -> Result<ValidationReport, Fault> {
        let busy = self.core.lock_worker().slot.recompute_target();
        if busy.is_some_and(|(busy_domain, _)| busy_domain == domain) {
            return self.reject("Load definitions", Fault::WorkerBusy);
        }

        let capacity = self.core.lock_state().table(domain).capacity();
        let memory = self.core.platform.memory.as_ref();
        let report = validate_definitions(domain, &definitions, capacity, memory);
        if !report.is_valid() {
            let message = format!("{} table: {}", domain.label(), report.errors.join("; "));
            self.core
                .platform
                .events
                .report(EventId::DefinitionsRejected, &message);
            return self.reject("Load definitions", Fault::InvalidDefinition(message));
        }

        {
            let mut state = self.core.lock_state();
            state.table_mut(domain).reload(definitions);
            if state.cursor.domain == domain {
                state.cursor.entry_index = 0;
            }
            if domain == ChecksumDomain::EepromTable {
                state.eeprom_aggregate = None;
            }
        }

        self.accept(
            EventId::DefinitionsValidated,
            &format!(
                "{} table verification results: good = {}, bad = {}, unused = {}",
                domain.label(),
                report.good,
                report.bad,
                report.unused
            ),
        );
        Ok(report)
    }
}
