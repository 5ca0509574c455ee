//! Block streams with shared history.
//!
//! In a chained stream each block may reference up to [`WINDOW_SIZE`] bytes
//! of the blocks before it. Both sides keep a history buffer of
//! `WINDOW_SIZE + block_size * (1 + extra_memory)` bytes; when the next
//! block would not fit, the last [`WINDOW_SIZE`] bytes slide to the front.
//! Extra memory makes slides rarer. In an independent stream every block
//! stands alone and no history is kept.

use super::decode::{decompress_safe, decompress_with_prefix};
use super::matcher::{HashWidth, START_INDEX, Window};
use super::{BlockEncoder, WINDOW_SIZE};
use crate::level::CompressionLevel;
use oxilz4_core::error::{Lz4Error, Result};
use std::ops::Range;

/// Indices are rebased once they approach this value.
const RENORM_LIMIT: u64 = 1 << 30;

fn history_capacity(block_size: usize, extra_memory: usize) -> usize {
    WINDOW_SIZE + block_size * (1 + extra_memory)
}

/// Encoder side of a block stream.
#[derive(Debug)]
pub struct StreamEncoder {
    encoder: BlockEncoder,
    history: Vec<u8>,
    capacity: usize,
    base: u32,
    block_size: usize,
    chained: bool,
}

impl StreamEncoder {
    /// Create a stream for blocks of at most `block_size` bytes.
    pub fn new(
        level: CompressionLevel,
        block_size: usize,
        chained: bool,
        extra_memory: usize,
    ) -> Self {
        let capacity = if chained {
            history_capacity(block_size, extra_memory)
        } else {
            0
        };
        let mut stream = Self {
            encoder: BlockEncoder::strict(level),
            history: Vec::with_capacity(capacity),
            capacity,
            base: START_INDEX,
            block_size,
            chained,
        };
        stream.reset();
        stream
    }

    /// Whether blocks may reference earlier blocks.
    pub fn is_chained(&self) -> bool {
        self.chained
    }

    /// Maximum block size.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Drop all history.
    pub fn reset(&mut self) {
        self.history.clear();
        self.base = START_INDEX;
        self.encoder
            .reset(START_INDEX, HashWidth::for_input(self.block_size));
    }

    /// Compress the next block of the stream into `dst`.
    ///
    /// [`Lz4Error::OutputTooSmall`] means the block did not fit in `dst`;
    /// the block still becomes history, so the caller may store it raw and
    /// continue.
    pub fn compress_next(&mut self, block: &[u8], dst: &mut [u8]) -> Result<usize> {
        if block.len() > self.block_size {
            return Err(Lz4Error::invalid_argument(format!(
                "block of {} bytes exceeds block size {}",
                block.len(),
                self.block_size
            )));
        }

        if !self.chained {
            self.encoder
                .reset(START_INDEX, HashWidth::for_input(block.len()));
            let w = Window {
                buf: block,
                base: START_INDEX,
                low: 0,
            };
            return self.encoder.compress_window(&w, 0, block.len(), dst);
        }

        if self.history.len() + block.len() > self.capacity {
            self.slide();
        }
        if u64::from(self.base) + self.capacity as u64 > RENORM_LIMIT {
            let delta = (self.base - START_INDEX) & !0xFFFF;
            log::debug!("rebasing stream indices by {delta}");
            self.encoder.renormalize(delta);
            self.base -= delta;
        }

        let start = self.history.len();
        self.history.extend_from_slice(block);
        let w = Window {
            buf: &self.history,
            base: self.base,
            low: 0,
        };
        self.encoder
            .compress_window(&w, start, self.history.len(), dst)
    }

    fn slide(&mut self) {
        let len = self.history.len();
        let keep = len.min(WINDOW_SIZE);
        let drop = len - keep;
        self.history.copy_within(drop.., 0);
        self.history.truncate(keep);
        self.base += drop as u32;
        log::trace!("encoder history slid by {drop} bytes");
    }
}

/// Decoder side of a block stream.
///
/// Decoded blocks live in the history buffer; the returned ranges index
/// [`StreamDecoder::history`] and stay valid until the next block.
#[derive(Debug)]
pub struct StreamDecoder {
    history: Vec<u8>,
    len: usize,
    block_size: usize,
    chained: bool,
}

impl StreamDecoder {
    /// Create a stream for blocks of at most `block_size` decoded bytes.
    pub fn new(block_size: usize, chained: bool, extra_memory: usize) -> Self {
        let capacity = if chained {
            history_capacity(block_size, extra_memory)
        } else {
            block_size
        };
        Self {
            history: vec![0u8; capacity],
            len: 0,
            block_size,
            chained,
        }
    }

    /// Drop all history.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// The history buffer.
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    fn make_room(&mut self) {
        if !self.chained {
            self.len = 0;
        } else if self.len + self.block_size > self.history.len() {
            let keep = self.len.min(WINDOW_SIZE);
            self.history.copy_within(self.len - keep..self.len, 0);
            self.len = keep;
        }
    }

    /// Decode the next compressed block; returns where its bytes landed.
    ///
    /// A block that decodes to more than the block size is corrupt.
    pub fn decompress_next(&mut self, block: &[u8]) -> Result<Range<usize>> {
        self.make_room();
        let start = self.len;
        let end = start + self.block_size;
        let result = if self.chained {
            decompress_with_prefix(block, &mut self.history[..end], start)
        } else {
            decompress_safe(block, &mut self.history[..end])
        };
        let n = result.map_err(|err| match err {
            Lz4Error::OutputTooSmall { needed, .. } => Lz4Error::corrupted(
                0,
                format!(
                    "block decodes to at least {needed} bytes, over the {} byte limit",
                    self.block_size
                ),
            ),
            other => other,
        })?;
        self.len += n;
        Ok(start..start + n)
    }

    /// Append a stored (uncompressed) block to the history.
    pub fn store_raw(&mut self, raw: &[u8]) -> Result<Range<usize>> {
        if raw.len() > self.block_size {
            return Err(Lz4Error::invalid_argument(format!(
                "raw block of {} bytes exceeds block size {}",
                raw.len(),
                self.block_size
            )));
        }
        self.make_room();
        let start = self.len;
        self.history[start..start + raw.len()].copy_from_slice(raw);
        self.len += raw.len();
        Ok(start..self.len)
    }
}
