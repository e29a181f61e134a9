//! Background scanning
//!
//! Round-robins over the six domains in a fixed order, one bounded chunk of
//! one entry per tick.

mod cursor;
mod scheduler;

pub use cursor::ScanCursor;
pub use scheduler::{BackgroundScanner, TickOutcome};
