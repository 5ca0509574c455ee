//! # OxiLZ4 Core
//!
//! Core components for the OxiLZ4 codec.
//!
//! - [`buffer`]: little-endian peek/poke, overlapping copies, fills
//! - [`checksum`]: XXH32 helpers used by the frame format
//! - [`traits`]: push-style streaming `Compressor`/`Decompressor`
//! - [`error`]: the error taxonomy shared by every layer
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     oxilz4 compress / decompress / info / bench        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     Frame stream codec, single-shot envelope           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Match engine, fast/HC/optimal encoders, decoder    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     Buffer operations, XXH32, errors, traits           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxilz4_core::buffer::{peek_u32, wild_copy};
//! use oxilz4_core::checksum::xxhash32;
//!
//! let mut buf = *b"ab\0\0\0\0";
//! wild_copy(&mut buf, 2, 2, 4);
//! assert_eq!(&buf, b"ababab");
//! assert_eq!(peek_u32(&buf, 0), u32::from_le_bytes(*b"abab"));
//! assert_eq!(xxhash32(b""), 0x02CC5D05);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod checksum;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use checksum::{ContentHasher, xxhash32};
pub use error::{Lz4Error, Result};
pub use traits::{CompressStatus, Compressor, DecompressStatus, Decompressor, FlushMode};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Lz4Error, Result};
    pub use crate::traits::{
        CompressStatus, Compressor, DecompressStatus, Decompressor, FlushMode,
    };
}
