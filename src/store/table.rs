//! Per-domain definition and result tables

use crate::domain::{ChecksumDomain, EntryRef, EntryState};
use crate::fault::Fault;

use super::definition::DefinitionEntry;
use super::entry::ResultEntry;

/// Definitions, results and the domain-wide enable flag for one domain
#[derive(Debug, Clone)]
pub struct DomainTable {
    domain: ChecksumDomain,
    capacity: usize,
    state: EntryState,
    definitions: Vec<DefinitionEntry>,
    results: Vec<ResultEntry>,
}

impl DomainTable {
    /// Builds a table padded with empty slots up to `capacity`.
    ///
    /// Single-entry domains always have capacity 1.
    pub fn new(
        domain: ChecksumDomain,
        capacity: usize,
        state: EntryState,
        definitions: Vec<DefinitionEntry>,
    ) -> Self {
        let capacity = if domain.is_single_entry() { 1 } else { capacity };
        let mut table = Self {
            domain,
            capacity,
            state,
            definitions: Vec::new(),
            results: Vec::new(),
        };
        table.reload(definitions);
        table
    }

    pub fn domain(&self) -> ChecksumDomain {
        self.domain
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.iter().all(ResultEntry::is_empty)
    }

    /// Domain-wide enable flag
    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == EntryState::Enabled
    }

    pub fn set_state(&mut self, state: EntryState) {
        self.state = state;
    }

    pub fn results(&self) -> &[ResultEntry] {
        &self.results
    }

    pub fn definitions(&self) -> &[DefinitionEntry] {
        &self.definitions
    }

    pub fn result(&self, index: u16) -> Option<&ResultEntry> {
        self.results.get(usize::from(index))
    }

    pub fn result_mut(&mut self, index: u16) -> Option<&mut ResultEntry> {
        self.results.get_mut(usize::from(index))
    }

    pub fn definition(&self, index: u16) -> Option<&DefinitionEntry> {
        self.definitions.get(usize::from(index))
    }

    /// Replaces the definitions and rebuilds every result entry from them.
    /// Baselines, progress and cached resolutions are dropped.
    pub fn reload(&mut self, definitions: Vec<DefinitionEntry>) {
        let mut definitions = definitions;
        definitions.truncate(self.capacity);
        while definitions.len() < self.capacity {
            definitions.push(DefinitionEntry::empty_for(self.domain));
        }
        self.results = definitions.iter().map(DefinitionEntry::to_result).collect();
        self.definitions = definitions;
    }

    /// Zeroes in-flight progress of every entry
    pub fn reset_progress(&mut self) {
        for entry in &mut self.results {
            entry.progress.reset();
        }
    }

    /// Resolves a commanded entry reference to a non-empty result index.
    pub fn find_index(&self, entry: &EntryRef) -> Result<u16, Fault> {
        let found = match entry {
            EntryRef::Index(index) if !self.domain.is_named() => self
                .result(*index)
                .filter(|e| !e.is_empty())
                .map(|_| *index),
            EntryRef::Name(name) if self.domain.is_named() => self
                .results
                .iter()
                .position(|e| !e.is_empty() && e.name().is_some_and(|n| n.as_str() == name))
                .and_then(|i| u16::try_from(i).ok()),
            _ => None,
        };

        found.ok_or_else(|| {
            Fault::InvalidEntry(format!(
                "{} {}, state: {}, max id: {}",
                self.domain.label(),
                entry,
                self.entry_state(entry),
                self.len().saturating_sub(1)
            ))
        })
    }

    /// State of the referenced entry, `Undefined` when it does not resolve
    pub fn entry_state(&self, entry: &EntryRef) -> EntryState {
        match entry {
            EntryRef::Index(index) if !self.domain.is_named() => self
                .result(*index)
                .map_or(EntryState::Undefined, |e| e.state),
            EntryRef::Name(name) if self.domain.is_named() => self
                .results
                .iter()
                .find(|e| !e.is_empty() && e.name().is_some_and(|n| n.as_str() == name))
                .map_or(EntryState::Undefined, |e| e.state),
            _ => EntryState::Undefined,
        }
    }

    /// Copies a new entry state into the matching definition: same index for
    /// range domains, same name for named domains. Returns false when there is
    /// no non-empty definition to update.
    pub fn mirror_definition_state(&mut self, index: u16, state: EntryState) -> bool {
        let target = match self.result(index).and_then(|r| r.name()).cloned() {
            Some(name) => self
                .definitions
                .iter_mut()
                .find(|d| !d.is_empty() && d.name() == Some(&name)),
            None => self
                .definitions
                .get_mut(usize::from(index))
                .filter(|d| !d.is_empty()),
        };

        match target {
            Some(definition) => {
                definition.state = state;
                true
            }
            None => false,
        }
    }

    /// Indices of every non-empty entry whose range covers `address`
    pub fn entries_containing(&self, address: usize) -> Vec<u16> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, e)| e.contains_address(address))
            .filter_map(|(i, _)| u16::try_from(i).ok())
            .collect()
    }

    /// First Enabled entry at or after `start`, skipping `claimed`
    pub fn next_enabled_from(&self, start: u16, claimed: Option<u16>) -> Option<u16> {
        self.results
            .iter()
            .enumerate()
            .skip(usize::from(start))
            .filter_map(|(i, e)| u16::try_from(i).ok().map(|i| (i, e)))
            .find(|(i, e)| e.is_enabled() && Some(*i) != claimed)
            .map(|(i, _)| i)
    }

    /// Wrapping sum of every baseline; entries without one count as zero
    pub fn aggregate_baseline(&self) -> u32 {
        self.results
            .iter()
            .filter_map(|e| e.baseline)
            .fold(0u32, u32::wrapping_add)
    }
}
