//! Background scan scheduler
//!
//! One call to [`BackgroundScanner::step`] does at most one entry's bounded
//! chunk of work. Faults never propagate: the entry is skipped for this pass
//! and the scan moves on.

use crate::adapter::{Adapter, StepOutcome};
use crate::app::ChecksumState;
use crate::domain::ChecksumDomain;
use crate::fault::Fault;
use crate::observability::{Counters, EventId};
use crate::platform::Platform;

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Checksumming or the domain is disabled
    Skipped { domain: ChecksumDomain },
    /// No enabled entries left in the domain
    DomainExhausted { domain: ChecksumDomain },
    /// Digested one chunk, the entry is not finished
    Progressed { domain: ChecksumDomain, index: u16 },
    /// Finished the entry
    Completed {
        domain: ChecksumDomain,
        index: u16,
        digest: u32,
        miscompare: bool,
    },
    /// The entry could not be read this pass
    Faulted {
        domain: ChecksumDomain,
        index: u16,
        fault: Fault,
    },
}

impl TickOutcome {
    /// True when an entry was touched
    pub fn did_work(&self) -> bool {
        matches!(
            self,
            TickOutcome::Progressed { .. }
                | TickOutcome::Completed { .. }
                | TickOutcome::Faulted { .. }
        )
    }

    pub fn domain(&self) -> ChecksumDomain {
        match self {
            TickOutcome::Skipped { domain }
            | TickOutcome::DomainExhausted { domain }
            | TickOutcome::Progressed { domain, .. }
            | TickOutcome::Completed { domain, .. }
            | TickOutcome::Faulted { domain, .. } => *domain,
        }
    }
}

/// Drives the background scan over borrowed state
pub struct BackgroundScanner<'a> {
    state: &'a mut ChecksumState,
    platform: &'a Platform,
    counters: &'a Counters,
    max_bytes_per_cycle: u32,
    /// Entry owned by an active Recompute; never touched here
    claimed: Option<(ChecksumDomain, u16)>,
    wrapped: bool,
}

impl<'a> BackgroundScanner<'a> {
    pub fn new(
        state: &'a mut ChecksumState,
        platform: &'a Platform,
        counters: &'a Counters,
        max_bytes_per_cycle: u32,
        claimed: Option<(ChecksumDomain, u16)>,
    ) -> Self {
        Self {
            state,
            platform,
            counters,
            max_bytes_per_cycle,
            claimed,
            wrapped: false,
        }
    }

    /// Steps until an entry was touched or the scan wrapped back to the
    /// first domain, whichever comes first.
    pub fn cycle(&mut self) -> TickOutcome {
        loop {
            let outcome = self.step();
            if outcome.did_work() || self.wrapped {
                return outcome;
            }
        }
    }

    /// One bounded unit of background work
    pub fn step(&mut self) -> TickOutcome {
        let domain = self.state.cursor.domain;

        if !self.state.checksum_enabled || !self.state.table(domain).is_enabled() {
            self.leave_domain(domain, false);
            return TickOutcome::Skipped { domain };
        }

        let claimed = self
            .claimed
            .filter(|(d, _)| *d == domain)
            .map(|(_, index)| index);
        let start = self.state.cursor.entry_index;
        let Some(index) = self.state.table(domain).next_enabled_from(start, claimed) else {
            self.leave_domain(domain, true);
            return TickOutcome::DomainExhausted { domain };
        };
        self.state.cursor.entry_index = index;

        let platform = self.platform;
        let adapter = Adapter::for_domain(domain, platform);
        let events = platform.events.as_ref();
        let Some(entry) = self.state.table_mut(domain).result_mut(index) else {
            self.leave_domain(domain, true);
            return TickOutcome::DomainExhausted { domain };
        };
        let identity = entry.describe(domain, index);

        let outcome = match adapter.step_entry(entry, self.max_bytes_per_cycle) {
            Ok(step) => {
                if step.reloaded {
                    events.report(
                        EventId::ResourceReloaded,
                        &format!("{} reloaded, checksum restarted", identity),
                    );
                }
                match step.outcome {
                    StepOutcome::InProgress => return TickOutcome::Progressed { domain, index },
                    StepOutcome::Done(digest) => {
                        let previous = entry.baseline.replace(digest);
                        entry.progress.reset();
                        let miscompare = previous.is_some_and(|baseline| baseline != digest);
                        if let (true, Some(expected)) = (miscompare, previous) {
                            self.counters.increment_mismatches(domain);
                            events.report(
                                EventId::Miscompare,
                                &format!(
                                    "Checksum Failure: {}, Expected: 0x{:08X}, Calculated: 0x{:08X}",
                                    identity, expected, digest
                                ),
                            );
                        }
                        TickOutcome::Completed {
                            domain,
                            index,
                            digest,
                            miscompare,
                        }
                    }
                }
            }
            Err(fault) => {
                let id = if fault.is_transient() {
                    EventId::ResourceSkipped
                } else {
                    EventId::ResourceError
                };
                events.report(id, &format!("{} skipped this pass: {}", identity, fault));
                TickOutcome::Faulted { domain, index, fault }
            }
        };

        self.advance_past(domain, index);
        outcome
    }

    fn advance_past(&mut self, domain: ChecksumDomain, index: u16) {
        let next = usize::from(index) + 1;
        if next >= self.state.table(domain).len() {
            self.leave_domain(domain, true);
        } else {
            self.state.cursor.entry_index = index + 1;
        }
    }

    /// `exhausted` is false when the domain was skipped as disabled
    fn leave_domain(&mut self, domain: ChecksumDomain, exhausted: bool) {
        if exhausted && domain == ChecksumDomain::EepromTable {
            self.state.eeprom_aggregate = Some(self.state.table(domain).aggregate_baseline());
        }
        if self.state.cursor.advance_domain() {
            self.wrapped = true;
            // Silent while globally disabled
            if !self.state.checksum_enabled {
                return;
            }
            self.platform.events.report(
                EventId::PassComplete,
                &format!("Background pass {} complete", self.state.cursor.pass_count),
            );
        }
    }
}
