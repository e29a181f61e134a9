//! Checksum configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! (if empty) configuration.

mod errors;
mod platform;

pub use errors::{ConfigError, ConfigResult};
pub use platform::{PlatformConfig, SegmentConfig, SimAppConfig, SimTableConfig, SimulatedPlatform};

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::Settings;
use crate::domain::{ChecksumDomain, EntryState, MAX_NAME_LEN};
use crate::store::{DefinitionEntry, DefinitionTarget};

/// Implicit entry of the cFE core or OS code segment domain
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SingleRangeConfig {
    /// `empty` when the region is not configured
    #[serde(default)]
    pub state: EntryState,
    #[serde(default)]
    pub start_address: usize,
    #[serde(default)]
    pub length: u32,
}

/// Definition table of a multi-entry domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Domain-wide enable flag
    #[serde(default = "default_enabled")]
    pub state: EntryState,
    #[serde(default)]
    pub entries: Vec<DefinitionEntry>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            state: default_enabled(),
            entries: Vec::new(),
        }
    }
}

/// Per-domain entry capacities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacities {
    #[serde(default = "default_eeprom_capacity")]
    pub eeprom: usize,
    #[serde(default = "default_memory_capacity")]
    pub memory: usize,
    #[serde(default = "default_tables_capacity")]
    pub tables: usize,
    #[serde(default = "default_apps_capacity")]
    pub apps: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            eeprom: default_eeprom_capacity(),
            memory: default_memory_capacity(),
            tables: default_tables_capacity(),
            apps: default_apps_capacity(),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Global enable flag at startup
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,

    /// Background bytes per tick and worker chunk size (0 = uncapped)
    #[serde(default = "default_max_bytes_per_cycle")]
    pub max_bytes_per_cycle: u32,

    /// Pause between worker chunks in milliseconds
    #[serde(default)]
    pub child_task_delay_ms: u64,

    #[serde(default)]
    pub capacities: Capacities,

    #[serde(default)]
    pub cfe_core: SingleRangeConfig,

    #[serde(default)]
    pub os_code_segment: SingleRangeConfig,

    #[serde(default)]
    pub eeprom: TableConfig,

    #[serde(default)]
    pub memory: TableConfig,

    #[serde(default)]
    pub tables: TableConfig,

    #[serde(default)]
    pub apps: TableConfig,

    /// Simulated collaborators for the CLI
    #[serde(default)]
    pub platform: PlatformConfig,
}

fn default_true() -> bool {
    true
}
fn default_enabled() -> EntryState {
    EntryState::Enabled
}
fn default_max_bytes_per_cycle() -> u32 {
    16 * 1024
}
fn default_eeprom_capacity() -> usize {
    16
}
fn default_memory_capacity() -> usize {
    16
}
fn default_tables_capacity() -> usize {
    24
}
fn default_apps_capacity() -> usize {
    24
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            checksum_enabled: default_true(),
            max_bytes_per_cycle: default_max_bytes_per_cycle(),
            child_task_delay_ms: 0,
            capacities: Capacities::default(),
            cfe_core: SingleRangeConfig::default(),
            os_code_segment: SingleRangeConfig::default(),
            eeprom: TableConfig::default(),
            memory: TableConfig::default(),
            tables: TableConfig::default(),
            apps: TableConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl ChecksumConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ChecksumConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks. Address ranges are checked later against the
    /// platform's memory map.
    pub fn validate(&self) -> ConfigResult<()> {
        let capacities = [
            ("eeprom", self.capacities.eeprom),
            ("memory", self.capacities.memory),
            ("tables", self.capacities.tables),
            ("apps", self.capacities.apps),
        ];
        for (name, capacity) in capacities {
            if capacity == 0 || capacity > usize::from(u16::MAX) {
                return Err(ConfigError::invalid(format!(
                    "capacities.{} must be between 1 and {}",
                    name,
                    u16::MAX
                )));
            }
        }

        for domain in ChecksumDomain::SCAN_ORDER {
            let state = self.domain_state(domain);
            if !state.is_active() {
                return Err(ConfigError::invalid(format!(
                    "{} state must be enabled or disabled, got {}",
                    domain.label(),
                    state
                )));
            }

            let entries = self.definitions(domain);
            if entries.len() > self.capacity(domain) {
                return Err(ConfigError::invalid(format!(
                    "{} has {} entries, capacity is {}",
                    domain.label(),
                    entries.len(),
                    self.capacity(domain)
                )));
            }

            if domain.is_named() {
                Self::validate_names(domain, &entries)?;
            }
        }

        for app in &self.platform.apps {
            if app.name.len() > MAX_NAME_LEN {
                return Err(ConfigError::invalid(format!(
                    "platform app name '{}' is too long",
                    app.name
                )));
            }
        }

        Ok(())
    }

    fn validate_names(domain: ChecksumDomain, entries: &[DefinitionEntry]) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let DefinitionTarget::Named { name } = &entry.target else {
                return Err(ConfigError::invalid(format!(
                    "{} entry {} must have a name",
                    domain.label(),
                    index
                )));
            };
            if name.is_empty() {
                if entry.state.is_active() {
                    return Err(ConfigError::invalid(format!(
                        "{} entry {} is {} but has no name",
                        domain.label(),
                        index,
                        entry.state
                    )));
                }
            } else if !seen.insert(name.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "{} entry {} duplicates name {}",
                    domain.label(),
                    index,
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            max_bytes_per_cycle: self.max_bytes_per_cycle,
            child_task_delay: Duration::from_millis(self.child_task_delay_ms),
        }
    }

    pub fn capacity(&self, domain: ChecksumDomain) -> usize {
        match domain {
            ChecksumDomain::CfeCore | ChecksumDomain::OsCodeSegment => 1,
            ChecksumDomain::EepromTable => self.capacities.eeprom,
            ChecksumDomain::MemoryTable => self.capacities.memory,
            ChecksumDomain::TablesTable => self.capacities.tables,
            ChecksumDomain::AppTable => self.capacities.apps,
        }
    }

    /// Initial domain-wide enable flag
    pub fn domain_state(&self, domain: ChecksumDomain) -> EntryState {
        match domain {
            ChecksumDomain::CfeCore => single_domain_state(&self.cfe_core),
            ChecksumDomain::OsCodeSegment => single_domain_state(&self.os_code_segment),
            ChecksumDomain::EepromTable => self.eeprom.state,
            ChecksumDomain::MemoryTable => self.memory.state,
            ChecksumDomain::TablesTable => self.tables.state,
            ChecksumDomain::AppTable => self.apps.state,
        }
    }

    /// Definition table for `domain`
    pub fn definitions(&self, domain: ChecksumDomain) -> Vec<DefinitionEntry> {
        match domain {
            ChecksumDomain::CfeCore => single_definition(&self.cfe_core),
            ChecksumDomain::OsCodeSegment => single_definition(&self.os_code_segment),
            ChecksumDomain::EepromTable => self.eeprom.entries.clone(),
            ChecksumDomain::MemoryTable => self.memory.entries.clone(),
            ChecksumDomain::TablesTable => self.tables.entries.clone(),
            ChecksumDomain::AppTable => self.apps.entries.clone(),
        }
    }
}

/// A single-entry region's state is its domain flag; an unconfigured region
/// leaves the domain enabled with nothing to scan.
fn single_domain_state(config: &SingleRangeConfig) -> EntryState {
    match config.state {
        EntryState::Disabled => EntryState::Disabled,
        EntryState::Undefined => EntryState::Undefined,
        EntryState::Empty | EntryState::Enabled => EntryState::Enabled,
    }
}

/// The implicit entry is always enabled once configured; scanning is
/// switched through the domain flag.
fn single_definition(config: &SingleRangeConfig) -> Vec<DefinitionEntry> {
    let state = match config.state {
        EntryState::Empty => EntryState::Empty,
        EntryState::Undefined => EntryState::Undefined,
        EntryState::Enabled | EntryState::Disabled => EntryState::Enabled,
    };
    vec![DefinitionEntry::range(config.start_address, config.length, state)]
}
