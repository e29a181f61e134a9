//! Simulated platform section
//!
//! Describes the memory, tables and applications the CLI runs the checksum
//! core against when no flight platform is present.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::fault::Fault;
use crate::platform::{AppRegistry, MemoryImage, TableRegistry};

use super::errors::{ConfigError, ConfigResult};

/// One mapped memory segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub base_address: usize,
    pub length: u32,
    /// Constant fill byte; ignored when `pattern_seed` is set
    #[serde(default)]
    pub fill: u8,
    /// Deterministic pseudo-random content
    #[serde(default)]
    pub pattern_seed: Option<u32>,
}

impl SegmentConfig {
    fn bytes(&self) -> Vec<u8> {
        match self.pattern_seed {
            None => vec![self.fill; self.length as usize],
            Some(seed) => {
                let mut bytes = vec![0u8; self.length as usize];
                StdRng::seed_from_u64(u64::from(seed)).fill_bytes(&mut bytes);
                bytes
            }
        }
    }
}

/// A loaded table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimTableConfig {
    pub name: String,
    pub address: usize,
    pub length: u32,
}

/// A running application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimAppConfig {
    pub name: String,
    #[serde(default)]
    pub address: usize,
    #[serde(default)]
    pub length: u32,
    #[serde(default = "default_true")]
    pub addresses_valid: bool,
}

fn default_true() -> bool {
    true
}

/// Simulated collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
    #[serde(default)]
    pub tables: Vec<SimTableConfig>,
    #[serde(default)]
    pub apps: Vec<SimAppConfig>,
}

/// Concrete simulated collaborators
pub struct SimulatedPlatform {
    pub memory: Arc<MemoryImage>,
    pub tables: Arc<TableRegistry>,
    pub apps: Arc<AppRegistry>,
}

impl PlatformConfig {
    pub fn build(&self) -> ConfigResult<SimulatedPlatform> {
        let memory = MemoryImage::new();
        for segment in &self.segments {
            memory
                .map_segment(segment.base_address, segment.bytes())
                .map_err(|e: Fault| {
                    ConfigError::invalid(format!(
                        "segment at 0x{:08X}: {}",
                        segment.base_address, e
                    ))
                })?;
        }

        let tables = TableRegistry::new();
        for table in &self.tables {
            tables.load(&table.name, table.address, table.length);
        }

        let apps = AppRegistry::new();
        for app in &self.apps {
            if app.addresses_valid {
                apps.start(&app.name, app.address, app.length);
            } else {
                apps.start_without_addresses(&app.name);
            }
        }

        Ok(SimulatedPlatform {
            memory: Arc::new(memory),
            tables: Arc::new(tables),
            apps: Arc::new(apps),
        })
    }
}
