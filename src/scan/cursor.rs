//! Scan cursor

use serde::Serialize;

use crate::domain::ChecksumDomain;

/// Position of the background scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanCursor {
    pub domain: ChecksumDomain,
    pub entry_index: u16,
    /// Completed round-robin passes
    pub pass_count: u32,
}

impl Default for ScanCursor {
    fn default() -> Self {
        Self {
            domain: ChecksumDomain::CfeCore,
            entry_index: 0,
            pass_count: 0,
        }
    }
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to the first entry of the next domain. Returns true when this
    /// wrapped from the last domain, completing a pass.
    pub fn advance_domain(&mut self) -> bool {
        self.entry_index = 0;
        match self.domain.next() {
            Some(next) => {
                self.domain = next;
                false
            }
            None => {
                self.domain = ChecksumDomain::CfeCore;
                self.pass_count = self.pass_count.wrapping_add(1);
                true
            }
        }
    }
}
