//! Definition entries and definition table validation

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{ChecksumDomain, EntryName, EntryState};
use crate::platform::MemoryMap;

use super::entry::ResultEntry;

/// What a definition points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionTarget {
    Range { start_address: usize, length: u32 },
    Named { name: EntryName },
}

/// Load-time configuration of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    pub state: EntryState,
    #[serde(flatten)]
    pub target: DefinitionTarget,
}

impl DefinitionEntry {
    pub fn range(start_address: usize, length: u32, state: EntryState) -> Self {
        Self {
            state,
            target: DefinitionTarget::Range {
                start_address,
                length,
            },
        }
    }

    pub fn named(name: EntryName, state: EntryState) -> Self {
        Self {
            state,
            target: DefinitionTarget::Named { name },
        }
    }

    /// Unused slot shaped for `domain`
    pub fn empty_for(domain: ChecksumDomain) -> Self {
        if domain.is_named() {
            Self::named(EntryName::default(), EntryState::Empty)
        } else {
            Self::range(0, 0, EntryState::Empty)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == EntryState::Empty
    }

    pub fn name(&self) -> Option<&EntryName> {
        match &self.target {
            DefinitionTarget::Named { name } => Some(name),
            DefinitionTarget::Range { .. } => None,
        }
    }

    /// Fresh result entry: no baseline, no progress
    pub fn to_result(&self) -> ResultEntry {
        match &self.target {
            DefinitionTarget::Range {
                start_address,
                length,
            } => ResultEntry::range(*start_address, *length, self.state),
            DefinitionTarget::Named { name } => ResultEntry::named(name.clone(), self.state),
        }
    }
}

/// Outcome of validating a definition table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub good: usize,
    pub bad: usize,
    pub unused: usize,
    /// One line per rejected entry
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.bad == 0 && self.errors.is_empty()
    }

    fn reject(&mut self, message: String) {
        self.bad += 1;
        self.errors.push(message);
    }
}

/// Checks a definition table for `domain`.
///
/// Range entries that are in use must pass memory validation. Named entries
/// that are in use need a non-empty name that no later entry repeats.
pub fn validate_definitions(
    domain: ChecksumDomain,
    entries: &[DefinitionEntry],
    capacity: usize,
    memory: &dyn MemoryMap,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if entries.len() > capacity {
        report.errors.push(format!(
            "{} table has {} entries, capacity is {}",
            domain.label(),
            entries.len(),
            capacity
        ));
    }

    let mut seen_names = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.state == EntryState::Undefined {
            report.reject(format!("entry {}: illegal state {}", index, entry.state));
            continue;
        }

        match (&entry.target, domain.is_named()) {
            (DefinitionTarget::Range { .. }, true) | (DefinitionTarget::Named { .. }, false) => {
                report.reject(format!(
                    "entry {}: wrong entry shape for {} table",
                    index,
                    domain.label()
                ));
            }
            (DefinitionTarget::Range { .. }, false) if entry.is_empty() => report.unused += 1,
            (
                DefinitionTarget::Range {
                    start_address,
                    length,
                },
                false,
            ) => match memory.validate_range(*start_address, *length) {
                Ok(()) => report.good += 1,
                Err(fault) => report.reject(format!("entry {}: {}", index, fault)),
            },
            (DefinitionTarget::Named { name }, true) => {
                if name.is_empty() {
                    if entry.is_empty() {
                        report.unused += 1;
                    } else {
                        report.reject(format!(
                            "entry {}: {} entry has no name",
                            index, entry.state
                        ));
                    }
                } else if !seen_names.insert(name.as_str()) {
                    report.reject(format!("entry {}: duplicate name {}", index, name));
                } else if entry.is_empty() {
                    report.unused += 1;
                } else {
                    report.good += 1;
                }
            }
        }
    }

    report
}
