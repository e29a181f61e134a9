//! Digest accumulator
//!
//! The digest is CRC32 (IEEE polynomial) carried as a running value: the
//! result of one call seeds the next, so a byte range can be folded in any
//! number of consecutive chunks and still produce its single-shot value.
//!
//! This is an order-sensitive change detector, not a cryptographic hash.

mod accumulator;

pub use accumulator::{digest, extend};
