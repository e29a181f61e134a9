//! Exclusive worker
//!
//! A single slot arbitrates between Recompute (full rebaseline of one entry)
//! and One-Shot (digest of an ad-hoc range). Both run to completion on a
//! scheduler task; there is no queueing and no preemption.

mod controller;
mod slot;
mod tasks;

pub use slot::{OneShotProgress, OneShotReport, WorkerControl, WorkerSlot};
