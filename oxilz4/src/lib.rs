//! Pure Rust LZ4 compression.
//!
//! LZ4 trades compression ratio for speed: decoding is a tight loop of
//! literal copies and back-references. This crate provides three encoders
//! over one block format and two containers around it.
//!
//! # Features
//!
//! - Fast greedy encoder (level 0), hash-chain lazy encoder (levels 3-9)
//!   and optimal parser (levels 10-12)
//! - Block decoder with exact, bounded and partial modes, prefix and
//!   external dictionaries
//! - Frame format compatible with the `lz4` command-line tool, as sans-io
//!   state machines and `std::io` adapters
//! - Single-shot envelope for small buffers
//!
//! # Example
//!
//! ```
//! use oxilz4::{compress, decompress};
//!
//! let data = b"Hello, World! Hello, World!";
//! let compressed = compress(data).unwrap();
//! let decompressed = decompress(&compressed).unwrap();
//! assert_eq!(decompressed, data);
//! ```
//!
//! Block level:
//!
//! ```
//! use oxilz4::block::{compress_block, decompress_block};
//! use oxilz4::CompressionLevel;
//!
//! let data = b"abcabcabcabcabcabcabcabcabcabc";
//! let block = compress_block(data, CompressionLevel::DEFAULT_HC).unwrap();
//! assert_eq!(decompress_block(&block, data.len()).unwrap(), data);
//! ```

pub mod block;
pub mod envelope;
pub mod frame;
pub mod level;

pub use block::{BlockEncoder, compress_block, compress_bound, decompress_block};
pub use frame::{
    BlockSize, FRAME_MAGIC, FrameDecoder, FrameDescriptor, FrameEncoder, FrameReader,
    FrameSettings, FrameWriter, compress_frame, decompress_frame, read_frame_descriptor,
};
pub use level::{CompressionLevel, Strategy};
pub use oxilz4_core::{Lz4Error, Result};

/// Compress `data` into a frame with default settings.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    compress_frame(data, &FrameSettings::default())
}

/// Compress `data` into a frame at `level`.
pub fn compress_with_level(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_frame(data, &FrameSettings::new().with_level(level))
}

/// Decompress a frame.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_frame(data)
}
