//! Definition and result entry stores
//!
//! Definitions are the load-time configuration of each domain. Results are
//! the runtime state built from them: state, baseline and resumable
//! progress. Results are never destroyed individually, only reset.

mod definition;
mod entry;
mod table;

pub use definition::{validate_definitions, DefinitionEntry, DefinitionTarget, ValidationReport};
pub use entry::{EntrySource, Progress, ResultEntry};
pub use table::DomainTable;
