//! Result entries: per-entry runtime state

use serde::Serialize;

use crate::domain::{ChecksumDomain, EntryName, EntryState};
use crate::platform::Resolution;

/// Resumable digest progress
///
/// `byte_offset <= length` always holds for the entry's current length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub byte_offset: u32,
    pub partial_accumulator: u32,
}

impl Progress {
    pub fn reset(&mut self) {
        *self = Progress::default();
    }

    pub fn is_started(&self) -> bool {
        self.byte_offset > 0
    }
}

/// What an entry digests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySource {
    Range {
        start_address: usize,
        length_bytes: u32,
    },
    Named {
        name: EntryName,
        /// Last resolution; compared on every step to detect reloads
        #[serde(skip)]
        resolved: Option<Resolution>,
    },
}

/// Runtime state of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub source: EntrySource,
    pub state: EntryState,
    /// `None` until the first full digest
    pub baseline: Option<u32>,
    pub progress: Progress,
}

impl ResultEntry {
    pub fn range(start_address: usize, length_bytes: u32, state: EntryState) -> Self {
        Self::with_source(
            EntrySource::Range {
                start_address,
                length_bytes,
            },
            state,
        )
    }

    pub fn named(name: EntryName, state: EntryState) -> Self {
        Self::with_source(
            EntrySource::Named {
                name,
                resolved: None,
            },
            state,
        )
    }

    fn with_source(source: EntrySource, state: EntryState) -> Self {
        Self {
            source,
            state,
            baseline: None,
            progress: Progress::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == EntryState::Empty
    }

    pub fn is_enabled(&self) -> bool {
        self.state == EntryState::Enabled
    }

    pub fn name(&self) -> Option<&EntryName> {
        match &self.source {
            EntrySource::Named { name, .. } => Some(name),
            EntrySource::Range { .. } => None,
        }
    }

    /// True for a non-empty range entry covering `address`
    pub fn contains_address(&self, address: usize) -> bool {
        match self.source {
            EntrySource::Range {
                start_address,
                length_bytes,
            } if !self.is_empty() => {
                address >= start_address && address - start_address < length_bytes as usize
            }
            _ => false,
        }
    }

    pub fn enable(&mut self) {
        self.state = EntryState::Enabled;
    }

    /// Disabling always discards in-flight progress
    pub fn disable(&mut self) {
        self.state = EntryState::Disabled;
        self.progress.reset();
    }

    /// Forgets the cached resolution and all progress
    pub fn restart(&mut self) {
        self.progress.reset();
        if let EntrySource::Named { resolved, .. } = &mut self.source {
            *resolved = None;
        }
    }

    /// Identity used in event text
    pub fn describe(&self, domain: ChecksumDomain, index: u16) -> String {
        match &self.source {
            EntrySource::Named { name, .. } => format!("{} {}", domain.label(), name),
            EntrySource::Range { .. } if domain.is_single_entry() => domain.label().to_string(),
            EntrySource::Range { .. } => format!("{} entry {}", domain.label(), index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_address_is_half_open() {
        let entry = ResultEntry::range(0x1000, 16, EntryState::Enabled);
        assert!(entry.contains_address(0x1000));
        assert!(entry.contains_address(0x100F));
        assert!(!entry.contains_address(0x1010));
        assert!(!entry.contains_address(0x0FFF));
    }

    #[test]
    fn test_empty_entries_never_contain() {
        let entry = ResultEntry::range(0x1000, 16, EntryState::Empty);
        assert!(!entry.contains_address(0x1004));
        let named = ResultEntry::named(EntryName::new("T").unwrap(), EntryState::Enabled);
        assert!(!named.contains_address(0));
    }

    #[test]
    fn test_disable_resets_progress() {
        let mut entry = ResultEntry::range(0x1000, 16, EntryState::Enabled);
        entry.progress = Progress {
            byte_offset: 8,
            partial_accumulator: 0x1234,
        };
        entry.baseline = Some(7);
        entry.disable();
        assert_eq!(entry.state, EntryState::Disabled);
        assert_eq!(entry.progress, Progress::default());
        assert_eq!(entry.baseline, Some(7));
    }

    #[test]
    fn test_describe() {
        let eeprom = ResultEntry::range(0, 4, EntryState::Enabled);
        assert_eq!(eeprom.describe(ChecksumDomain::EepromTable, 3), "Eeprom entry 3");
        assert_eq!(eeprom.describe(ChecksumDomain::CfeCore, 0), "cFE Core");
        let app = ResultEntry::named(EntryName::new("SCH").unwrap(), EntryState::Enabled);
        assert_eq!(app.describe(ChecksumDomain::AppTable, 2), "App SCH");
    }
}
