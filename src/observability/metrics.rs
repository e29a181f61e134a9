//! Command and miscompare counters
//!
//! Counters are shared between the main loop and the worker task, so they
//! are atomics with Relaxed ordering. Values only move up, except through an
//! explicit reset command.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::domain::ChecksumDomain;

/// Counter registry
#[derive(Debug, Default)]
pub struct Counters {
    /// Accepted commands
    commands: AtomicU64,
    /// Rejected commands and failed worker runs
    command_errors: AtomicU64,
    /// Background miscompares, one slot per domain in scan order
    mismatches: [AtomicU64; 6],
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_commands(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_command_errors(&self) {
        self.command_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_mismatches(&self, domain: ChecksumDomain) {
        self.mismatches[domain.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn commands(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }

    pub fn command_errors(&self) -> u64 {
        self.command_errors.load(Ordering::Relaxed)
    }

    pub fn mismatches(&self, domain: ChecksumDomain) -> u64 {
        self.mismatches[domain.index()].load(Ordering::Relaxed)
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.commands.store(0, Ordering::Relaxed);
        self.command_errors.store(0, Ordering::Relaxed);
        for counter in &self.mismatches {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            commands: self.commands(),
            command_errors: self.command_errors(),
            cfe_core_mismatches: self.mismatches(ChecksumDomain::CfeCore),
            os_code_segment_mismatches: self.mismatches(ChecksumDomain::OsCodeSegment),
            eeprom_mismatches: self.mismatches(ChecksumDomain::EepromTable),
            memory_mismatches: self.mismatches(ChecksumDomain::MemoryTable),
            tables_mismatches: self.mismatches(ChecksumDomain::TablesTable),
            apps_mismatches: self.mismatches(ChecksumDomain::AppTable),
        }
    }
}

/// Snapshot of counter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    pub commands: u64,
    pub command_errors: u64,
    pub cfe_core_mismatches: u64,
    pub os_code_segment_mismatches: u64,
    pub eeprom_mismatches: u64,
    pub memory_mismatches: u64,
    pub tables_mismatches: u64,
    pub apps_mismatches: u64,
}

impl CounterSnapshot {
    /// Mismatch counter for one domain
    pub fn mismatches(&self, domain: ChecksumDomain) -> u64 {
        match domain {
            ChecksumDomain::CfeCore => self.cfe_core_mismatches,
            ChecksumDomain::OsCodeSegment => self.os_code_segment_mismatches,
            ChecksumDomain::EepromTable => self.eeprom_mismatches,
            ChecksumDomain::MemoryTable => self.memory_mismatches,
            ChecksumDomain::TablesTable => self.tables_mismatches,
            ChecksumDomain::AppTable => self.apps_mismatches,
        }
    }

    /// Sum of all per-domain mismatch counters
    pub fn total_mismatches(&self) -> u64 {
        ChecksumDomain::SCAN_ORDER
            .iter()
            .map(|d| self.mismatches(*d))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = Counters::new();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn test_mismatches_are_per_domain() {
        let counters = Counters::new();
        counters.increment_mismatches(ChecksumDomain::EepromTable);
        counters.increment_mismatches(ChecksumDomain::EepromTable);
        counters.increment_mismatches(ChecksumDomain::AppTable);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.eeprom_mismatches, 2);
        assert_eq!(snapshot.apps_mismatches, 1);
        assert_eq!(snapshot.memory_mismatches, 0);
        assert_eq!(snapshot.total_mismatches(), 3);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let counters = Counters::new();
        counters.increment_commands();
        counters.increment_command_errors();
        counters.increment_mismatches(ChecksumDomain::CfeCore);

        counters.reset();
        assert_eq!(counters.snapshot(), CounterSnapshot::default());
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;
        use std::thread;

        let counters = Arc::new(Counters::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        c.increment_command_errors();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counters.command_errors(), 4000);
    }
}
