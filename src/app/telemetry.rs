//! Telemetry snapshot

use serde::Serialize;

use crate::domain::{ChecksumDomain, EntryState};
use crate::observability::CounterSnapshot;
use crate::scan::ScanCursor;
use crate::worker::{OneShotReport, WorkerSlot};

use super::ChecksumApp;

/// Per-domain summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainStatus {
    pub domain: ChecksumDomain,
    pub state: EntryState,
    pub enabled_entries: usize,
    pub baselined_entries: usize,
}

/// Everything housekeeping reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub counters: CounterSnapshot,
    pub checksum_enabled: bool,
    pub domains: Vec<DomainStatus>,
    pub cursor: ScanCursor,
    pub worker: WorkerSlot,
    pub last_one_shot: Option<OneShotReport>,
    pub cfe_core_baseline: Option<u32>,
    pub os_code_segment_baseline: Option<u32>,
    pub eeprom_aggregate: Option<u32>,
}

impl Telemetry {
    pub fn domain(&self, domain: ChecksumDomain) -> Option<&DomainStatus> {
        self.domains.iter().find(|d| d.domain == domain)
    }
}

impl ChecksumApp {
    pub fn telemetry(&self) -> Telemetry {
        let (worker, last_one_shot) = {
            let worker = self.core.lock_worker();
            (worker.slot, worker.last_one_shot)
        };

        let state = self.core.lock_state();
        let domains = state
            .tables()
            .map(|table| DomainStatus {
                domain: table.domain(),
                state: table.state(),
                enabled_entries: table.results().iter().filter(|e| e.is_enabled()).count(),
                baselined_entries: table.results().iter().filter(|e| e.baseline.is_some()).count(),
            })
            .collect();
        let single_baseline =
            |domain: ChecksumDomain| state.table(domain).result(0).and_then(|e| e.baseline);

        Telemetry {
            counters: self.core.counters.snapshot(),
            checksum_enabled: state.checksum_enabled,
            domains,
            cursor: state.cursor,
            worker,
            last_one_shot,
            cfe_core_baseline: single_baseline(ChecksumDomain::CfeCore),
            os_code_segment_baseline: single_baseline(ChecksumDomain::OsCodeSegment),
            eeprom_aggregate: state.eeprom_aggregate,
        }
    }
}
