//! Memory validation and bounds-checked reads

use std::sync::{PoisonError, RwLock};

use crate::fault::Fault;

/// Access to addressable memory
///
/// Every read goes through validation; nothing in the core dereferences raw
/// addresses.
pub trait MemoryMap: Send + Sync {
    /// Accepts `[address, address + length)` if it is fully mapped.
    fn validate_range(&self, address: usize, length: u32) -> Result<(), Fault>;

    /// Copies `length` bytes starting at `address`.
    fn read(&self, address: usize, length: u32) -> Result<Vec<u8>, Fault>;
}

#[derive(Debug, Clone)]
struct Segment {
    base: usize,
    bytes: Vec<u8>,
}

impl Segment {
    fn end(&self) -> usize {
        self.base + self.bytes.len()
    }

    /// Offset of `[address, address + length)` within this segment
    fn locate(&self, address: usize, length: usize) -> Option<usize> {
        let end = address.checked_add(length)?;
        if address >= self.base && end <= self.end() {
            Some(address - self.base)
        } else {
            None
        }
    }
}

/// Memory made of disjoint mapped segments
///
/// Stands in for target memory on the ground and in tests. Segments can be
/// patched while a scan is running to simulate corruption.
#[derive(Debug, Default)]
pub struct MemoryImage {
    segments: RwLock<Vec<Segment>>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryImage::map_segment`]
    pub fn with_segment(self, base: usize, bytes: Vec<u8>) -> Result<Self, Fault> {
        self.map_segment(base, bytes)?;
        Ok(self)
    }

    /// Maps a segment. Overlapping an existing segment is an error.
    pub fn map_segment(&self, base: usize, bytes: Vec<u8>) -> Result<(), Fault> {
        let length = u32::try_from(bytes.len()).map_err(|_| Fault::InvalidRange {
            address: base,
            length: u32::MAX,
        })?;
        let end = base.checked_add(bytes.len()).ok_or(Fault::InvalidRange {
            address: base,
            length,
        })?;

        let mut segments = self.segments.write().unwrap_or_else(PoisonError::into_inner);
        if segments.iter().any(|s| base < s.end() && s.base < end) {
            return Err(Fault::InvalidRange {
                address: base,
                length,
            });
        }
        segments.push(Segment { base, bytes });
        segments.sort_by_key(|s| s.base);
        Ok(())
    }

    /// Overwrites mapped bytes in place
    pub fn write(&self, address: usize, data: &[u8]) -> Result<(), Fault> {
        let mut segments = self.segments.write().unwrap_or_else(PoisonError::into_inner);
        let length = data.len();
        for segment in segments.iter_mut() {
            if let Some(offset) = segment.locate(address, length) {
                segment.bytes[offset..offset + length].copy_from_slice(data);
                return Ok(());
            }
        }
        Err(Fault::InvalidRange {
            address,
            length: u32::try_from(length).unwrap_or(u32::MAX),
        })
    }

    /// Number of mapped segments
    pub fn segment_count(&self) -> usize {
        self.segments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl MemoryMap for MemoryImage {
    fn validate_range(&self, address: usize, length: u32) -> Result<(), Fault> {
        let segments = self.segments.read().unwrap_or_else(PoisonError::into_inner);
        let len = length as usize;
        // A zero-length range must still start inside (or at the end of) a segment
        let mapped = segments.iter().any(|s| {
            if len == 0 {
                address >= s.base && address <= s.end()
            } else {
                s.locate(address, len).is_some()
            }
        });
        if mapped {
            Ok(())
        } else {
            Err(Fault::InvalidRange { address, length })
        }
    }

    fn read(&self, address: usize, length: u32) -> Result<Vec<u8>, Fault> {
        let segments = self.segments.read().unwrap_or_else(PoisonError::into_inner);
        let len = length as usize;
        if len == 0 {
            return Ok(Vec::new());
        }
        segments
            .iter()
            .find_map(|s| s.locate(address, len).map(|off| s.bytes[off..off + len].to_vec()))
            .ok_or(Fault::InvalidRange { address, length })
    }
}
