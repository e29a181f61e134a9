//! Platform collaborators
//!
//! The checksum core only talks to the outside world through these traits:
//! memory validation and reads, table and process lookups, event delivery,
//! and worker task scheduling. The in-process implementations back the CLI
//! simulation and the tests.

mod events;
mod memory;
mod resources;
mod tasks;

use std::sync::Arc;

pub use events::{EventRecord, EventSink, LogEventSink, LogTarget, MemoryEventSink};
pub use memory::{MemoryImage, MemoryMap};
pub use resources::{AppRegistry, ProcessManager, Resolution, TableManager, TableRegistry};
pub use tasks::{
    ManualScheduler, TaskContext, TaskEntry, TaskHandle, TaskScheduler, ThreadScheduler,
};

/// The full set of collaborators the checksum core runs against
#[derive(Clone)]
pub struct Platform {
    pub memory: Arc<dyn MemoryMap>,
    pub tables: Arc<dyn TableManager>,
    pub apps: Arc<dyn ProcessManager>,
    pub events: Arc<dyn EventSink>,
    pub tasks: Arc<dyn TaskScheduler>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Platform { .. }")
    }
}
