//! Named resource managers (tables, applications)

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::fault::Fault;

/// Where a named resource currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub address: usize,
    pub length: u32,
    /// Bumped by the owning manager every time the resource is reloaded
    pub generation: u64,
}

/// Table manager lookups
pub trait TableManager: Send + Sync {
    fn resolve_table(&self, name: &str) -> Result<Resolution, Fault>;
}

/// Process manager lookups
pub trait ProcessManager: Send + Sync {
    /// Code address and size of a running application
    fn resolve_app(&self, name: &str) -> Result<(usize, u32), Fault>;
}

#[derive(Debug, Clone)]
struct TableRecord {
    address: usize,
    length: u32,
    generation: u64,
    failure: Option<i32>,
}

/// In-process table manager
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<String, TableRecord>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table. Loading an already known name counts as a reload.
    pub fn load(&self, name: &str, address: usize, length: u32) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let generation = tables.get(name).map_or(1, |t| t.generation + 1);
        tables.insert(
            name.to_string(),
            TableRecord {
                address,
                length,
                generation,
                failure: None,
            },
        );
    }

    /// Bumps the generation without moving the table
    pub fn reload(&self, name: &str) -> Result<u64, Fault> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get_mut(name)
            .ok_or_else(|| Fault::NotFound(name.to_string()))?;
        table.generation += 1;
        Ok(table.generation)
    }

    pub fn unload(&self, name: &str) -> bool {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    /// Makes every lookup of `name` fail with `code` until the table is loaded again
    pub fn inject_failure(&self, name: &str, code: i32) -> Result<(), Fault> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get_mut(name)
            .ok_or_else(|| Fault::NotFound(name.to_string()))?;
        table.failure = Some(code);
        Ok(())
    }
}

impl TableManager for TableRegistry {
    fn resolve_table(&self, name: &str) -> Result<Resolution, Fault> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let table = tables
            .get(name)
            .ok_or_else(|| Fault::NotFound(name.to_string()))?;
        if let Some(code) = table.failure {
            return Err(Fault::ManagerError(code));
        }
        Ok(Resolution {
            address: table.address,
            length: table.length,
            generation: table.generation,
        })
    }
}

#[derive(Debug, Clone)]
struct AppRecord {
    address: usize,
    length: u32,
    addresses_valid: bool,
}

/// In-process application registry
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<HashMap<String, AppRecord>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or relocates) an application's code segment
    pub fn start(&self, name: &str, address: usize, length: u32) {
        self.insert(name, address, length, true);
    }

    /// Registers an application whose code address cannot be queried
    pub fn start_without_addresses(&self, name: &str) {
        self.insert(name, 0, 0, false);
    }

    pub fn stop(&self, name: &str) -> bool {
        self.apps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    fn insert(&self, name: &str, address: usize, length: u32, addresses_valid: bool) {
        self.apps.write().unwrap_or_else(PoisonError::into_inner).insert(
            name.to_string(),
            AppRecord {
                address,
                length,
                addresses_valid,
            },
        );
    }
}

impl ProcessManager for AppRegistry {
    fn resolve_app(&self, name: &str) -> Result<(usize, u32), Fault> {
        let apps = self.apps.read().unwrap_or_else(PoisonError::into_inner);
        let app = apps
            .get(name)
            .ok_or_else(|| Fault::NotFound(name.to_string()))?;
        if !app.addresses_valid {
            return Err(Fault::Unavailable(name.to_string()));
        }
        Ok((app.address, app.length))
    }
}
