//! Incremental compute step

use crate::digest;
use crate::fault::Fault;
use crate::store::Progress;

/// Result of one compute step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The range is fully digested; carries the digest
    Done(u32),
    /// More bytes remain
    InProgress,
}

/// Digests at most `max_bytes_per_cycle` more bytes of a range of `length`.
///
/// A budget of 0 means uncapped. `read(offset, len)` supplies the bytes;
/// if it fails, `progress` is left untouched so the same chunk is retried
/// later. A zero-length range is immediately `Done` with the seed.
pub fn compute_step<F>(
    progress: &mut Progress,
    length: u32,
    max_bytes_per_cycle: u32,
    read: F,
) -> Result<StepOutcome, Fault>
where
    F: FnOnce(u32, u32) -> Result<Vec<u8>, Fault>,
{
    // Only possible if the range shrank under a stale offset
    if progress.byte_offset > length {
        progress.reset();
    }

    let remaining = length - progress.byte_offset;
    if remaining == 0 {
        return Ok(StepOutcome::Done(progress.partial_accumulator));
    }

    let chunk_len = match max_bytes_per_cycle {
        0 => remaining,
        max => max.min(remaining),
    };

    let bytes = read(progress.byte_offset, chunk_len)?;
    if bytes.len() != chunk_len as usize {
        return Err(Fault::InvalidRange {
            address: progress.byte_offset as usize,
            length: chunk_len,
        });
    }

    progress.partial_accumulator = digest::extend(progress.partial_accumulator, &bytes);
    progress.byte_offset += chunk_len;

    if progress.byte_offset == length {
        Ok(StepOutcome::Done(progress.partial_accumulator))
    } else {
        Ok(StepOutcome::InProgress)
    }
}
