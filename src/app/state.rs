//! Scan state shared by the main loop and the worker task

use crate::domain::ChecksumDomain;
use crate::scan::ScanCursor;
use crate::store::DomainTable;

/// Everything the background scan and the Recompute worker mutate
#[derive(Debug, Clone)]
pub struct ChecksumState {
    /// Global enable flag
    pub checksum_enabled: bool,
    /// One table per domain, in scan order
    tables: [DomainTable; 6],
    pub cursor: ScanCursor,
    /// Wrapping sum of EEPROM baselines, published each time the scan
    /// leaves the EEPROM domain
    pub eeprom_aggregate: Option<u32>,
}

impl ChecksumState {
    pub fn new(checksum_enabled: bool, build: impl FnMut(ChecksumDomain) -> DomainTable) -> Self {
        Self {
            checksum_enabled,
            tables: ChecksumDomain::SCAN_ORDER.map(build),
            cursor: ScanCursor::new(),
            eeprom_aggregate: None,
        }
    }

    pub fn table(&self, domain: ChecksumDomain) -> &DomainTable {
        &self.tables[domain.index()]
    }

    pub fn table_mut(&mut self, domain: ChecksumDomain) -> &mut DomainTable {
        &mut self.tables[domain.index()]
    }

    pub fn tables(&self) -> impl Iterator<Item = &DomainTable> {
        self.tables.iter()
    }

    /// Zeroes in-flight progress everywhere
    pub fn reset_all_progress(&mut self) {
        for table in &mut self.tables {
            table.reset_progress();
        }
    }
}
