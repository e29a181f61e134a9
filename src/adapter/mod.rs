//! Resource domain adapters
//!
//! Range domains (cFE core, OS code segment, EEPROM, memory) digest a fixed
//! address range. Named domains (tables, applications) first resolve a name
//! through the owning manager and restart the digest whenever the resource
//! was reloaded or moved since the last resolution.

mod compute;

pub use compute::{compute_step, StepOutcome};

use crate::domain::ChecksumDomain;
use crate::fault::Fault;
use crate::platform::{MemoryMap, Platform, ProcessManager, Resolution, TableManager};
use crate::store::{EntrySource, ResultEntry};

/// Reads raw ranges through memory validation
#[derive(Clone, Copy)]
pub struct RangeAdapter<'a> {
    memory: &'a dyn MemoryMap,
}

impl<'a> RangeAdapter<'a> {
    pub fn new(memory: &'a dyn MemoryMap) -> Self {
        Self { memory }
    }

    /// `len` bytes at `start_address + offset`
    pub fn read_chunk(
        &self,
        start_address: usize,
        offset: u32,
        len: u32,
    ) -> Result<Vec<u8>, Fault> {
        let address = start_address
            .checked_add(offset as usize)
            .ok_or(Fault::InvalidRange {
                address: start_address,
                length: len,
            })?;
        self.memory.read(address, len)
    }

    pub fn validate_range(&self, address: usize, length: u32) -> Result<(), Fault> {
        self.memory.validate_range(address, length)
    }
}

/// Manager a named domain resolves through
#[derive(Clone, Copy)]
pub enum Resolver<'a> {
    Tables(&'a dyn TableManager),
    Apps(&'a dyn ProcessManager),
}

/// Resolves names, then reads like a [`RangeAdapter`]
#[derive(Clone, Copy)]
pub struct NamedAdapter<'a> {
    resolver: Resolver<'a>,
    range: RangeAdapter<'a>,
}

impl<'a> NamedAdapter<'a> {
    pub fn new(resolver: Resolver<'a>, memory: &'a dyn MemoryMap) -> Self {
        Self {
            resolver,
            range: RangeAdapter::new(memory),
        }
    }

    /// Current location of `name`. Applications carry no generation, so a
    /// relocation shows up as a changed address or length instead.
    pub fn resolve(&self, name: &str) -> Result<Resolution, Fault> {
        match self.resolver {
            Resolver::Tables(tables) => tables.resolve_table(name),
            Resolver::Apps(apps) => {
                let (address, length) = apps.resolve_app(name)?;
                Ok(Resolution {
                    address,
                    length,
                    generation: 0,
                })
            }
        }
    }
}

/// Adapter for one domain
#[derive(Clone, Copy)]
pub enum Adapter<'a> {
    Range(RangeAdapter<'a>),
    Named(NamedAdapter<'a>),
}

/// One compute step applied to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStep {
    pub outcome: StepOutcome,
    /// The named resource changed since the previous step; the digest and
    /// baseline were restarted before this step
    pub reloaded: bool,
}

impl<'a> Adapter<'a> {
    pub fn for_domain(domain: ChecksumDomain, platform: &'a Platform) -> Self {
        let memory = platform.memory.as_ref();
        match domain {
            ChecksumDomain::TablesTable => {
                let resolver = Resolver::Tables(platform.tables.as_ref());
                Adapter::Named(NamedAdapter::new(resolver, memory))
            }
            ChecksumDomain::AppTable => {
                Adapter::Named(NamedAdapter::new(Resolver::Apps(platform.apps.as_ref()), memory))
            }
            ChecksumDomain::CfeCore
            | ChecksumDomain::OsCodeSegment
            | ChecksumDomain::EepromTable
            | ChecksumDomain::MemoryTable => Adapter::Range(RangeAdapter::new(memory)),
        }
    }

    /// Resolves the entry's byte source and runs one compute step on it.
    ///
    /// A failed resolution or read leaves the entry's progress untouched.
    pub fn step_entry(
        &self,
        entry: &mut ResultEntry,
        max_bytes_per_cycle: u32,
    ) -> Result<EntryStep, Fault> {
        match (self, &mut entry.source) {
            (
                Adapter::Range(range),
                EntrySource::Range {
                    start_address,
                    length_bytes,
                },
            ) => {
                let start = *start_address;
                let outcome = compute_step(
                    &mut entry.progress,
                    *length_bytes,
                    max_bytes_per_cycle,
                    |off, len| range.read_chunk(start, off, len),
                )?;
                Ok(EntryStep {
                    outcome,
                    reloaded: false,
                })
            }
            (Adapter::Named(named), EntrySource::Named { name, resolved }) => {
                let current = named.resolve(name.as_str())?;
                let reloaded = resolved.is_some_and(|previous| previous != current);
                *resolved = Some(current);
                if reloaded {
                    entry.progress.reset();
                    entry.baseline = None;
                }
                let outcome = compute_step(
                    &mut entry.progress,
                    current.length,
                    max_bytes_per_cycle,
                    |off, len| named.range.read_chunk(current.address, off, len),
                )?;
                Ok(EntryStep { outcome, reloaded })
            }
            _ => Err(Fault::InvalidEntry("entry shape does not match its domain".to_string())),
        }
    }

    /// Checks that a named entry currently resolves. Range entries always do.
    pub fn probe(&self, entry: &ResultEntry) -> Result<(), Fault> {
        match (self, &entry.source) {
            (Adapter::Named(named), EntrySource::Named { name, .. }) => {
                named.resolve(name.as_str()).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::digest;
    use crate::domain::{EntryName, EntryState};
    use crate::platform::{
        AppRegistry, ManualScheduler, MemoryEventSink, MemoryImage, TableRegistry,
    };

    struct Fixture {
        memory: Arc<MemoryImage>,
        tables: Arc<TableRegistry>,
        apps: Arc<AppRegistry>,
        platform: Platform,
    }

    fn fixture() -> Fixture {
        let memory = Arc::new(
            MemoryImage::new()
                .with_segment(0x1000, (0u8..=255).collect())
                .unwrap(),
        );
        let tables = Arc::new(TableRegistry::new());
        let apps = Arc::new(AppRegistry::new());
        let platform = Platform {
            memory: memory.clone(),
            tables: tables.clone(),
            apps: apps.clone(),
            events: Arc::new(MemoryEventSink::new()),
            tasks: Arc::new(ManualScheduler::new()),
        };
        Fixture {
            memory,
            tables,
            apps,
            platform,
        }
    }

    fn bytes(memory: &MemoryImage, address: usize, len: u32) -> Vec<u8> {
        memory.read(address, len).unwrap()
    }

    #[test]
    fn test_range_entry_steps_to_digest() {
        let fx = fixture();
        let adapter = Adapter::for_domain(ChecksumDomain::EepromTable, &fx.platform);
        let mut entry = ResultEntry::range(0x1000, 16, EntryState::Enabled);

        for _ in 0..3 {
            let step = adapter.step_entry(&mut entry, 4).unwrap();
            assert_eq!(step.outcome, StepOutcome::InProgress);
        }
        let step = adapter.step_entry(&mut entry, 4).unwrap();
        let expected = digest::digest(&bytes(&fx.memory, 0x1000, 16));
        assert_eq!(step.outcome, StepOutcome::Done(expected));
        assert_eq!(entry.progress.byte_offset, 16);
    }

    #[test]
    fn test_unmapped_range_faults_without_progress() {
        let fx = fixture();
        let adapter = Adapter::for_domain(ChecksumDomain::MemoryTable, &fx.platform);
        let mut entry = ResultEntry::range(0x1100 - 4, 16, EntryState::Enabled);

        assert_eq!(adapter.step_entry(&mut entry, 4).unwrap().outcome, StepOutcome::InProgress);
        let err = adapter.step_entry(&mut entry, 16).unwrap_err();
        assert!(matches!(err, Fault::InvalidRange { .. }));
        assert_eq!(entry.progress.byte_offset, 4);
    }

    #[test]
    fn test_table_reload_restarts_and_clears_baseline() {
        let fx = fixture();
        fx.tables.load("CS.Tbl", 0x1010, 8);
        let adapter = Adapter::for_domain(ChecksumDomain::TablesTable, &fx.platform);
        let mut entry = ResultEntry::named(EntryName::new("CS.Tbl").unwrap(), EntryState::Enabled);

        let step = adapter.step_entry(&mut entry, 4).unwrap();
        assert!(!step.reloaded);
        entry.baseline = Some(99);

        fx.tables.reload("CS.Tbl").unwrap();
        let step = adapter.step_entry(&mut entry, 4).unwrap();
        assert!(step.reloaded);
        assert_eq!(step.outcome, StepOutcome::InProgress);
        assert_eq!(entry.progress.byte_offset, 4);
        assert_eq!(entry.baseline, None);
    }

    #[test]
    fn test_app_relocation_counts_as_reload() {
        let fx = fixture();
        fx.apps.start("SCH", 0x1000, 8);
        let adapter = Adapter::for_domain(ChecksumDomain::AppTable, &fx.platform);
        let mut entry = ResultEntry::named(EntryName::new("SCH").unwrap(), EntryState::Enabled);

        let step = adapter.step_entry(&mut entry, 0).unwrap();
        assert_eq!(
            step.outcome,
            StepOutcome::Done(digest::digest(&bytes(&fx.memory, 0x1000, 8)))
        );
        entry.progress.reset();

        fx.apps.start("SCH", 0x1020, 8);
        let step = adapter.step_entry(&mut entry, 0).unwrap();
        assert!(step.reloaded);
        assert_eq!(
            step.outcome,
            StepOutcome::Done(digest::digest(&bytes(&fx.memory, 0x1020, 8)))
        );
    }

    #[test]
    fn test_named_faults_propagate() {
        let fx = fixture();
        fx.apps.start_without_addresses("HK");
        let tables = Adapter::for_domain(ChecksumDomain::TablesTable, &fx.platform);
        let apps = Adapter::for_domain(ChecksumDomain::AppTable, &fx.platform);

        let mut missing = ResultEntry::named(EntryName::new("NOPE").unwrap(), EntryState::Enabled);
        assert_eq!(
            tables.step_entry(&mut missing, 4),
            Err(Fault::NotFound("NOPE".into()))
        );
        assert!(tables.probe(&missing).is_err());

        let mut hk = ResultEntry::named(EntryName::new("HK").unwrap(), EntryState::Enabled);
        assert_eq!(apps.step_entry(&mut hk, 4), Err(Fault::Unavailable("HK".into())));
    }

    #[test]
    fn test_shape_mismatch_is_invalid_entry() {
        let fx = fixture();
        let adapter = Adapter::for_domain(ChecksumDomain::AppTable, &fx.platform);
        let mut entry = ResultEntry::range(0x1000, 4, EntryState::Enabled);
        assert!(matches!(
            adapter.step_entry(&mut entry, 4),
            Err(Fault::InvalidEntry(_))
        ));
    }
}
