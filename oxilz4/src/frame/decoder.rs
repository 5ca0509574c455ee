//! Sans-io frame decoder.

use super::descriptor::{FrameDescriptor, check_flags, check_magic, optional_len};
use super::encoder::RAW_BLOCK_FLAG;
use super::settings::MAX_EXTRA_MEMORY;
use crate::block::StreamDecoder;
use oxilz4_core::buffer::peek_u32;
use oxilz4_core::checksum::{ContentHasher, xxhash32};
use oxilz4_core::error::{Lz4Error, Result};
use oxilz4_core::traits::{DecompressStatus, Decompressor};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Magic,
    Flags,
    Descriptor { flg: u8 },
    BlockHeader,
    Block { len: usize, raw: bool },
    ContentChecksum,
    Finished,
    Failed,
}

/// Frame decoder state machine.
///
/// Input is staged until the current field is complete, so callers may feed
/// it in pieces of any size, down to one byte at a time. Decoded bytes are
/// served from the block history.
#[derive(Debug)]
pub struct FrameDecoder {
    stage: Stage,
    staging: Vec<u8>,
    extra_memory: usize,
    descriptor: Option<FrameDescriptor>,
    stream: Option<StreamDecoder>,
    hasher: Option<ContentHasher>,
    ready: Range<usize>,
    total_in: u64,
    total_out: u64,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        Self {
            stage: Stage::Magic,
            staging: Vec::new(),
            extra_memory: 0,
            descriptor: None,
            stream: None,
            hasher: None,
            ready: 0..0,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Create a decoder that keeps `extra_memory` additional blocks of
    /// history for chained frames.
    pub fn with_extra_memory(extra_memory: usize) -> Result<Self> {
        if extra_memory > MAX_EXTRA_MEMORY {
            return Err(Lz4Error::invalid_argument(format!(
                "extra memory {extra_memory} exceeds {MAX_EXTRA_MEMORY}"
            )));
        }
        Ok(Self {
            extra_memory,
            ..Self::new()
        })
    }

    /// The frame descriptor, once the header has been read.
    pub fn descriptor(&self) -> Option<&FrameDescriptor> {
        self.descriptor.as_ref()
    }

    /// Whether the header has been read and validated.
    pub fn header_parsed(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Input bytes still missing from the field being read.
    pub fn bytes_needed(&self) -> usize {
        self.field_len().saturating_sub(self.staging.len())
    }

    /// Frame bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Decoded bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    fn field_len(&self) -> usize {
        let block_checksum = self.descriptor.is_some_and(|d| d.block_checksum);
        match self.stage {
            Stage::Magic | Stage::BlockHeader | Stage::ContentChecksum => 4,
            Stage::Flags => 2,
            Stage::Descriptor { flg } => 2 + optional_len(flg) + 1,
            Stage::Block { len, .. } => len + if block_checksum { 4 } else { 0 },
            Stage::Finished | Stage::Failed => 0,
        }
    }

    fn history(&self) -> &[u8] {
        match &self.stream {
            Some(stream) => stream.history(),
            None => &[],
        }
    }

    /// Handle the complete field in `staging`.
    fn advance(&mut self) -> Result<()> {
        let at = self.total_in - self.staging.len() as u64;
        match self.stage {
            Stage::Magic => {
                check_magic(peek_u32(&self.staging, 0), at)?;
                self.stage = Stage::Flags;
            }
            Stage::Flags => {
                let flg = self.staging[0];
                check_flags(flg, self.staging[1], at)?;
                // The descriptor is parsed whole, FLG and BD included.
                self.stage = Stage::Descriptor { flg };
                return Ok(());
            }
            Stage::Descriptor { .. } => {
                let descriptor = FrameDescriptor::decode(&self.staging, at)?;
                if descriptor.dictionary_id.is_some() {
                    return Err(Lz4Error::unsupported("preset dictionaries"));
                }
                self.stream = Some(StreamDecoder::new(
                    descriptor.block_size.bytes(),
                    descriptor.block_chaining,
                    self.extra_memory,
                ));
                self.hasher = descriptor.content_checksum.then(ContentHasher::new);
                self.descriptor = Some(descriptor);
                self.stage = Stage::BlockHeader;
                log::debug!("frame header: {descriptor:?}");
            }
            Stage::BlockHeader => self.read_block_header(at)?,
            Stage::Block { len, raw } => self.read_block(len, raw, at)?,
            Stage::ContentChecksum => {
                let stored = peek_u32(&self.staging, 0);
                let computed = self.hasher.as_ref().map_or(0, ContentHasher::digest);
                if stored != computed {
                    return Err(Lz4Error::checksum_mismatch(
                        "content checksum",
                        at,
                        stored,
                        computed,
                    ));
                }
                self.finish();
            }
            Stage::Finished | Stage::Failed => {}
        }
        self.staging.clear();
        Ok(())
    }

    fn read_block_header(&mut self, at: u64) -> Result<()> {
        let word = peek_u32(&self.staging, 0);
        let Some(descriptor) = self.descriptor else {
            return Err(Lz4Error::invalid_argument("block header before frame header"));
        };
        if word == 0 {
            if let Some(declared) = descriptor.content_length {
                if declared != self.total_out {
                    return Err(Lz4Error::corrupted(
                        at,
                        format!(
                            "frame declared {declared} bytes of content but holds {}",
                            self.total_out
                        ),
                    ));
                }
            }
            if descriptor.content_checksum {
                self.stage = Stage::ContentChecksum;
            } else {
                self.finish();
            }
            return Ok(());
        }

        let raw = word & RAW_BLOCK_FLAG != 0;
        let len = (word & !RAW_BLOCK_FLAG) as usize;
        let block_size = descriptor.block_size.bytes();
        if len > block_size {
            return Err(Lz4Error::corrupted(
                at,
                format!("block length {len} exceeds the {block_size} byte block size"),
            ));
        }
        if !raw && len == block_size {
            return Err(Lz4Error::corrupted(
                at,
                format!("compressed block fills the whole {block_size} byte block size"),
            ));
        }
        self.stage = Stage::Block { len, raw };
        Ok(())
    }

    fn read_block(&mut self, len: usize, raw: bool, at: u64) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(Lz4Error::invalid_argument("block before frame header"));
        };
        let payload = &self.staging[..len];
        if self.staging.len() > len {
            let stored = peek_u32(&self.staging, len);
            let computed = xxhash32(payload);
            if stored != computed {
                return Err(Lz4Error::checksum_mismatch(
                    "block checksum",
                    at + len as u64,
                    stored,
                    computed,
                ));
            }
        }

        let range = if raw {
            stream.store_raw(payload)?
        } else {
            stream
                .decompress_next(payload)
                .map_err(|err| err.rebased(at))?
        };
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(&stream.history()[range.clone()]);
        }
        log::trace!(
            "block at {}: {} bytes {} -> {} bytes",
            at,
            len,
            if raw { "raw" } else { "compressed" },
            range.len()
        );
        self.total_out += range.len() as u64;
        self.ready = range;
        self.stage = Stage::BlockHeader;
        Ok(())
    }

    fn finish(&mut self) {
        self.stage = Stage::Finished;
        log::debug!(
            "frame finished: {} -> {} bytes",
            self.total_in,
            self.total_out
        );
    }
}

impl Decompressor for FrameDecoder {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize, DecompressStatus)> {
        if self.stage == Stage::Failed {
            return Err(Lz4Error::invalid_argument(
                "frame decoder used after an error",
            ));
        }

        let mut consumed = 0;
        let mut written = 0;
        loop {
            if !self.ready.is_empty() {
                let n = self.ready.len().min(output.len() - written);
                let start = self.ready.start;
                output[written..written + n].copy_from_slice(&self.history()[start..start + n]);
                self.ready.start += n;
                written += n;
                if !self.ready.is_empty() {
                    return Ok((consumed, written, DecompressStatus::NeedsOutput));
                }
            }
            if self.stage == Stage::Finished {
                return Ok((consumed, written, DecompressStatus::Done));
            }

            let take = self.bytes_needed().min(input.len() - consumed);
            self.staging
                .extend_from_slice(&input[consumed..consumed + take]);
            consumed += take;
            self.total_in += take as u64;
            if self.bytes_needed() > 0 {
                return Ok((consumed, written, DecompressStatus::NeedsInput));
            }
            if let Err(err) = self.advance() {
                self.stage = Stage::Failed;
                return Err(err);
            }
        }
    }

    fn reset(&mut self) {
        self.stage = Stage::Magic;
        self.staging.clear();
        self.descriptor = None;
        self.stream = None;
        self.hasher = None;
        self.ready = 0..0;
        self.total_in = 0;
        self.total_out = 0;
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Finished && self.ready.is_empty()
    }

    fn input_needed(&self) -> usize {
        self.bytes_needed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameEncoder, FrameSettings};

    fn encode(data: &[u8], settings: &FrameSettings) -> Vec<u8> {
        let mut enc = FrameEncoder::new(settings).expect("valid settings");
        let mut out = Vec::new();
        enc.update(data, &mut out).expect("update");
        enc.finish(&mut out).expect("finish");
        out
    }

    #[test]
    fn test_byte_at_a_time() {
        let data = b"to be or not to be, that is the question. ".repeat(200);
        let frame = encode(&data, &FrameSettings::new());
        let mut dec = FrameDecoder::new();
        let mut decoded = Vec::new();
        let mut buf = [0u8; 3];
        for &byte in &frame {
            let mut input: &[u8] = &[byte];
            loop {
                let (c, w, status) = dec.decompress(input, &mut buf).expect("valid");
                input = &input[c..];
                decoded.extend_from_slice(&buf[..w]);
                if status != DecompressStatus::NeedsOutput {
                    break;
                }
            }
        }
        assert!(dec.is_finished());
        assert_eq!(decoded, data);
        assert_eq!(dec.total_in(), frame.len() as u64);
    }

    #[test]
    fn test_header_exposed_before_blocks() {
        let frame = encode(b"abc", &FrameSettings::new().with_content_length(3));
        let mut dec = FrameDecoder::new();
        let header_len = 7 + 8;
        let (c, w, status) = dec.decompress(&frame[..header_len], &mut []).expect("valid");
        assert_eq!((c, w, status), (header_len, 0, DecompressStatus::NeedsInput));
        assert!(dec.header_parsed());
        assert_eq!(dec.descriptor().and_then(|d| d.content_length), Some(3));
        assert_eq!(dec.bytes_needed(), 4);
    }

    #[test]
    fn test_failed_decoder_stays_failed() {
        let mut dec = FrameDecoder::new();
        assert!(dec.decompress(&[0, 0, 0, 0], &mut []).is_err());
        assert!(dec.decompress(&[], &mut []).is_err());
        dec.reset();
        assert!(dec.decompress(&[], &mut []).is_ok());
    }

    #[test]
    fn test_extra_memory_limit() {
        assert!(FrameDecoder::with_extra_memory(MAX_EXTRA_MEMORY).is_ok());
        assert!(FrameDecoder::with_extra_memory(MAX_EXTRA_MEMORY + 1).is_err());
    }
}
