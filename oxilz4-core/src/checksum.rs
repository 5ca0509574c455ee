//! XXH32 checksums used by the frame format.
//!
//! Thin layer over the `xxhash-rust` crate. The frame format uses XXH32
//! with seed 0 in three places: the one-byte header checksum, the optional
//! per-block checksum and the optional content checksum.

use xxhash_rust::xxh32::{Xxh32, xxh32};

/// Compute XXH32 of `data` with seed 0.
#[inline]
pub fn xxhash32(data: &[u8]) -> u32 {
    xxh32(data, 0)
}

/// Compute the frame header checksum byte: bits 8..16 of XXH32.
#[inline]
pub fn header_checksum(descriptor: &[u8]) -> u8 {
    (xxhash32(descriptor) >> 8) as u8
}

/// Incremental XXH32 (seed 0) for content checksums.
#[derive(Clone)]
pub struct ContentHasher {
    state: Xxh32,
    total: u64,
}

impl ContentHasher {
    /// Create a new hasher.
    pub fn new() -> Self {
        Self {
            state: Xxh32::new(0),
            total: 0,
        }
    }

    /// Feed more content.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
        self.total += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Current digest. Does not consume the hasher.
    pub fn digest(&self) -> u32 {
        self.state.digest()
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHasher")
            .field("total", &self.total)
            .field("digest", &format_args!("{:#010x}", self.digest()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xxhash32_known_vectors() {
        assert_eq!(xxhash32(b""), 0x02CC_5D05);
        assert_eq!(xxhash32(b"a"), 0x550D_7456);
        assert_eq!(xxhash32(b"abc"), 0x32D1_53FF);
    }

    #[test]
    fn test_header_checksum_default_descriptor() {
        // FLG = 0x60 (version 1, independent blocks), BD = 0x40 (64 KiB).
        // The reference lz4 tool emits 0x82 for this descriptor.
        assert_eq!(header_checksum(&[0x60, 0x40]), 0x82);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();
        let mut hasher = ContentHasher::new();
        for chunk in data.chunks(7) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.digest(), xxhash32(&data));
        assert_eq!(hasher.total(), 1000);
    }
}
