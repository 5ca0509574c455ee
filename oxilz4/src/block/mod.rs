//! LZ4 block compression/decompression.
//!
//! LZ4 block format:
//! - Sequences of (token, [literal_length_ext], literals, offset, [match_length_ext])
//! - Token: 4-bit literal length + 4-bit match length
//! - If a nibble is 15, additional bytes follow (add 255 until byte < 255)
//! - Offset: 2 bytes little-endian (1-65535)
//! - Match length is +4 (minimum match = 4)
//! - The last sequence holds literals only
//!
//! Reference decoders also require the last 5 bytes of a block to be
//! literals and the last match to start at least 12 bytes before the end.
//! [`BlockEncoder`] relaxes this for inputs shorter than 13 bytes so that
//! tiny runs still compress; the frame encoder never does.

mod decode;
mod fast;
mod hc;
mod matcher;
mod optimal;
mod sequence;
mod stream;

pub use decode::{
    decompress_block, decompress_partial, decompress_safe, decompress_sized,
    decompress_using_dict, decompress_with_prefix,
};
pub use stream::{StreamDecoder, StreamEncoder};

use crate::level::{CompressionLevel, FastParams, HcParams, OptimalParams, Strategy};
use matcher::{FAST_HASH_LOG, HashChain, HashTable, HashWidth, START_INDEX, Window};
use optimal::OptNode;
use oxilz4_core::error::{Lz4Error, Result};
use sequence::SequenceWriter;

/// Minimum match length.
pub const MIN_MATCH: usize = 4;

/// Bytes at the end of a block that are always literals.
pub const LAST_LITERALS: usize = 5;

/// The last match must start at least this many bytes before the block end.
pub const MF_LIMIT: usize = 12;

/// Shortest input the regular encoders try to find matches in.
pub const MIN_INPUT_LENGTH: usize = MF_LIMIT + 1;

/// Maximum match offset (16-bit).
pub const MAX_DISTANCE: usize = 65535;

/// History kept between chained blocks.
pub const WINDOW_SIZE: usize = 64 * 1024;

/// Largest input a single block call accepts.
pub const MAX_INPUT_SIZE: usize = 0x7E00_0000;

pub(crate) const RUN_MASK: usize = 15;
pub(crate) const ML_MASK: usize = 15;

/// Worst-case encoded size of `len` input bytes.
#[inline]
pub const fn compress_bound(len: usize) -> usize {
    len + len / 255 + 16
}

/// Match-finding state, one variant per strategy.
enum EncoderState {
    Fast {
        params: FastParams,
        table: HashTable,
    },
    Hc {
        params: HcParams,
        chain: HashChain,
    },
    Optimal {
        params: OptimalParams,
        chain: HashChain,
        nodes: Vec<OptNode>,
    },
}

/// Reusable block encoder.
///
/// Holds the match tables for one compression level so repeated calls do
/// not reallocate them.
pub struct BlockEncoder {
    level: CompressionLevel,
    state: EncoderState,
    relaxed_tail: bool,
}

impl BlockEncoder {
    /// Create an encoder for `level`.
    pub fn new(level: CompressionLevel) -> Self {
        let state = match level.strategy() {
            Strategy::Fast(params) => EncoderState::Fast {
                params,
                table: HashTable::new(FAST_HASH_LOG),
            },
            Strategy::Hc(params) => EncoderState::Hc {
                params,
                chain: HashChain::new(),
            },
            Strategy::Optimal(params) => EncoderState::Optimal {
                params,
                chain: HashChain::new(),
                nodes: optimal::new_nodes(),
            },
        };
        Self {
            level,
            state,
            relaxed_tail: true,
        }
    }

    /// Encoder whose output always satisfies the reference end-of-block rules.
    pub(crate) fn strict(level: CompressionLevel) -> Self {
        Self {
            relaxed_tail: false,
            ..Self::new(level)
        }
    }

    /// Compression level.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compress `src` as an independent block into `dst`.
    ///
    /// Returns the encoded length, or [`Lz4Error::OutputTooSmall`] if the
    /// block does not fit; `dst` of [`compress_bound`]`(src.len())` bytes
    /// always suffices.
    pub fn compress_into(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        if src.len() > MAX_INPUT_SIZE {
            return Err(Lz4Error::invalid_argument(format!(
                "block input of {} bytes exceeds {MAX_INPUT_SIZE}",
                src.len()
            )));
        }
        self.reset(START_INDEX, HashWidth::for_input(src.len()));
        let w = Window {
            buf: src,
            base: START_INDEX,
            low: 0,
        };
        let n = self.compress_window(&w, 0, src.len(), dst)?;
        log::trace!(
            "level {} block: {} -> {} bytes",
            self.level,
            src.len(),
            n
        );
        Ok(n)
    }

    /// Compress `src` as an independent block into a new vector.
    pub fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; compress_bound(src.len())];
        let n = self.compress_into(src, &mut dst)?;
        dst.truncate(n);
        Ok(dst)
    }

    /// Forget indexed history; indexing restarts at `start`.
    pub(crate) fn reset(&mut self, start: u32, width: HashWidth) {
        match &mut self.state {
            EncoderState::Fast { table, .. } => table.reset(width),
            EncoderState::Hc { chain, .. } | EncoderState::Optimal { chain, .. } => {
                chain.reset(start)
            }
        }
    }

    pub(crate) fn renormalize(&mut self, delta: u32) {
        match &mut self.state {
            EncoderState::Fast { table, .. } => table.renormalize(delta),
            EncoderState::Hc { chain, .. } | EncoderState::Optimal { chain, .. } => {
                chain.renormalize(delta)
            }
        }
    }

    /// Encode `w.buf[start..end]`, matching against everything in the window.
    pub(crate) fn compress_window(
        &mut self,
        w: &Window<'_>,
        start: usize,
        end: usize,
        dst: &mut [u8],
    ) -> Result<usize> {
        let mut out = SequenceWriter::new(dst);
        if self.relaxed_tail && end - start < MIN_INPUT_LENGTH {
            fast::compress_tiny(w, start, end, &mut out)?;
            return Ok(out.len());
        }
        match &mut self.state {
            EncoderState::Fast { params, table } => {
                fast::compress(table, *params, w, start, end, &mut out)?
            }
            EncoderState::Hc { params, chain } => {
                hc::compress(chain, *params, w, start, end, &mut out)?
            }
            EncoderState::Optimal {
                params,
                chain,
                nodes,
            } => optimal::compress(chain, nodes, *params, w, start, end, &mut out)?,
        }
        Ok(out.len())
    }
}

impl std::fmt::Debug for BlockEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockEncoder")
            .field("level", &self.level)
            .field("strategy", &self.level.strategy().name())
            .finish()
    }
}

/// Compress `src` as one independent block.
pub fn compress_block(src: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    BlockEncoder::new(level).compress(src)
}

/// Compress `src` as one independent block into `dst`, returning the
/// encoded length.
pub fn compress_block_into(src: &[u8], dst: &mut [u8], level: CompressionLevel) -> Result<usize> {
    BlockEncoder::new(level).compress_into(src, dst)
}
