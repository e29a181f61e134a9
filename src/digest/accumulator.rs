//! CRC32 accumulator over `crc32fast`

use crc32fast::Hasher;

/// Folds `bytes` into the running digest `seed`.
///
/// For any split of a range into consecutive chunks, feeding each result back
/// in as the next seed yields the same value as one call over the whole range.
/// An empty slice returns `seed` unchanged.
pub fn extend(seed: u32, bytes: &[u8]) -> u32 {
    if bytes.is_empty() {
        return seed;
    }
    let mut hasher = Hasher::new_with_initial(seed);
    hasher.update(bytes);
    hasher.finalize()
}

/// Digest of a complete range, starting from a zero seed.
pub fn digest(bytes: &[u8]) -> u32 {
    extend(0, bytes)
}
