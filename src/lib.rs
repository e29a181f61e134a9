//! flight-checksum - resumable, budget-bounded integrity scanning
//!
//! Continuously verifies memory ranges, loaded tables and application code
//! against baselines captured on the first pass, with on-demand recompute
//! and one-shot checksums running in a single worker slot.

pub mod adapter;
pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod digest;
pub mod domain;
pub mod fault;
pub mod observability;
pub mod platform;
pub mod scan;
pub mod store;
pub mod worker;

pub use app::{BaselineReport, ChecksumApp, Settings, Telemetry};
pub use command::{dispatch, Command, CommandResponse};
pub use config::ChecksumConfig;
pub use domain::{ChecksumDomain, EntryName, EntryRef, EntryState};
pub use fault::{Fault, FaultResult};
pub use scan::{ScanCursor, TickOutcome};
