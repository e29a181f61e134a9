//! Shared fixtures for the integration tests
//!
//! Memory layout of the simulated target:
//! - 0x1000..0x1100  counting pattern 0x00..0xFF
//! - 0xA000..0xA040  repeating 0xA5
//!
//! Tables: `SCH.Sched` at 0x1000 (32 bytes)
//! Apps:   `SCH` at 0x1040 (16 bytes)

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use flight_checksum::config::{ChecksumConfig, TableConfig};
use flight_checksum::domain::{ChecksumDomain, EntryName, EntryState};
use flight_checksum::platform::{
    AppRegistry, ManualScheduler, MemoryEventSink, MemoryImage, Platform, TableRegistry,
    TaskScheduler, ThreadScheduler,
};
use flight_checksum::store::DefinitionEntry;
use flight_checksum::{ChecksumApp, TickOutcome};

pub const LOW_BASE: usize = 0x1000;
pub const HIGH_BASE: usize = 0xA000;

pub struct Harness {
    pub app: ChecksumApp,
    pub memory: Arc<MemoryImage>,
    pub tables: Arc<TableRegistry>,
    pub apps: Arc<AppRegistry>,
    pub events: MemoryEventSink,
    pub tasks: Arc<ManualScheduler>,
}

impl Harness {
    /// Steps until the cursor reaches `domain`
    pub fn tick_until_domain(&mut self, domain: ChecksumDomain) -> u32 {
        let mut ticks = 0;
        while self.app.cursor().domain != domain {
            self.app.background_step();
            ticks += 1;
            assert!(ticks < 10_000, "cursor never reached {:?}", domain);
        }
        ticks
    }

    /// Steps until one full pass has completed
    pub fn run_pass(&mut self) -> Vec<TickOutcome> {
        let target = self.app.cursor().pass_count + 1;
        let mut outcomes = Vec::new();
        while self.app.cursor().pass_count < target {
            outcomes.push(self.app.background_step());
            assert!(outcomes.len() < 10_000, "pass never completed");
        }
        outcomes
    }

    pub fn bytes(&self, address: usize, length: usize) -> Vec<u8> {
        use flight_checksum::platform::MemoryMap;
        self.memory.read(address, length as u32).unwrap()
    }
}

pub fn name(s: &str) -> EntryName {
    EntryName::new(s).unwrap()
}

/// EEPROM entries 0..=2 empty, 3 and 4 enabled 16-byte ranges
pub fn eeprom_entries() -> Vec<DefinitionEntry> {
    let domain = ChecksumDomain::EepromTable;
    vec![
        DefinitionEntry::empty_for(domain),
        DefinitionEntry::empty_for(domain),
        DefinitionEntry::empty_for(domain),
        DefinitionEntry::range(LOW_BASE, 16, EntryState::Enabled),
        DefinitionEntry::range(LOW_BASE + 0x10, 16, EntryState::Enabled),
    ]
}

pub fn base_config() -> ChecksumConfig {
    let mut config = ChecksumConfig {
        max_bytes_per_cycle: 4,
        ..ChecksumConfig::default()
    };
    config.eeprom = TableConfig {
        state: EntryState::Enabled,
        entries: eeprom_entries(),
    };
    config.tables = TableConfig {
        state: EntryState::Enabled,
        entries: vec![DefinitionEntry::named(name("SCH.Sched"), EntryState::Enabled)],
    };
    config.apps = TableConfig {
        state: EntryState::Enabled,
        entries: vec![DefinitionEntry::named(name("SCH"), EntryState::Enabled)],
    };
    config
}

pub fn harness() -> Harness {
    harness_with(base_config())
}

pub fn harness_with(config: ChecksumConfig) -> Harness {
    let tasks = Arc::new(ManualScheduler::new());
    let sim = simulation(tasks.clone());
    let app = ChecksumApp::new(&config, sim.platform).unwrap();

    Harness {
        app,
        memory: sim.memory,
        tables: sim.tables,
        apps: sim.apps,
        events: sim.events,
        tasks,
    }
}

/// Same simulation, but worker tasks run on real threads
pub struct ThreadedHarness {
    pub app: ChecksumApp,
    pub memory: Arc<MemoryImage>,
    pub events: MemoryEventSink,
    pub tasks: Arc<ThreadScheduler>,
}

impl ThreadedHarness {
    pub fn bytes(&self, address: usize, length: usize) -> Vec<u8> {
        use flight_checksum::platform::MemoryMap;
        self.memory.read(address, length as u32).unwrap()
    }
}

pub fn threaded_harness(config: ChecksumConfig) -> ThreadedHarness {
    let tasks = Arc::new(ThreadScheduler::new());
    let sim = simulation(tasks.clone());
    let app = ChecksumApp::new(&config, sim.platform).unwrap();

    ThreadedHarness {
        app,
        memory: sim.memory,
        events: sim.events,
        tasks,
    }
}

/// Polls `condition` every millisecond until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

struct Simulation {
    platform: Platform,
    memory: Arc<MemoryImage>,
    tables: Arc<TableRegistry>,
    apps: Arc<AppRegistry>,
    events: MemoryEventSink,
}

fn simulation(tasks: Arc<dyn TaskScheduler>) -> Simulation {
    let memory = Arc::new(
        MemoryImage::new()
            .with_segment(LOW_BASE, (0u8..=255).collect())
            .unwrap()
            .with_segment(HIGH_BASE, vec![0xA5; 0x40])
            .unwrap(),
    );
    let tables = Arc::new(TableRegistry::new());
    tables.load("SCH.Sched", LOW_BASE, 32);
    let apps = Arc::new(AppRegistry::new());
    apps.start("SCH", LOW_BASE + 0x40, 16);
    let events = MemoryEventSink::new();

    let platform = Platform {
        memory: memory.clone(),
        tables: tables.clone(),
        apps: apps.clone(),
        events: Arc::new(events.clone()),
        tasks,
    };

    Simulation {
        platform,
        memory,
        tables,
        apps,
        events,
    }
}
