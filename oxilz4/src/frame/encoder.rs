//! Sans-io frame encoder.

use super::descriptor::FrameDescriptor;
use super::settings::FrameSettings;
use crate::block::StreamEncoder;
use oxilz4_core::error::{Lz4Error, Result};
use oxilz4_core::traits::{CompressStatus, Compressor, FlushMode};

/// Block length word flag for stored blocks.
pub(crate) const RAW_BLOCK_FLAG: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unopened,
    Open,
    Closed,
}

/// Frame encoder state machine.
///
/// Encoded bytes are appended to caller-supplied vectors; the encoder never
/// touches a transport. [`FrameWriter`](super::FrameWriter) drives it over
/// `std::io::Write`, and the [`Compressor`] impl drives it over fixed
/// output slices.
#[derive(Debug)]
pub struct FrameEncoder {
    descriptor: FrameDescriptor,
    stream: StreamEncoder,
    stage: Stage,
    block: Vec<u8>,
    scratch: Vec<u8>,
    // Encoded bytes not yet handed out through `Compressor::compress`.
    pending: Vec<u8>,
    pending_pos: usize,
    total_in: u64,
    total_out: u64,
    blocks: u64,
}

impl FrameEncoder {
    /// Create an encoder. Fails if the settings request a feature the
    /// encoder cannot produce.
    pub fn new(settings: &FrameSettings) -> Result<Self> {
        let descriptor = settings.descriptor()?;
        let block_size = descriptor.block_size.bytes();
        Ok(Self {
            descriptor,
            stream: StreamEncoder::new(
                settings.level,
                block_size,
                descriptor.block_chaining,
                settings.extra_memory,
            ),
            stage: Stage::Unopened,
            block: Vec::with_capacity(block_size),
            scratch: vec![0u8; block_size],
            pending: Vec::new(),
            pending_pos: 0,
            total_in: 0,
            total_out: 0,
            blocks: 0,
        })
    }

    /// The descriptor written in the header.
    pub fn descriptor(&self) -> &FrameDescriptor {
        &self.descriptor
    }

    /// Uncompressed bytes accepted so far.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Frame bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Whether the end marker has been written.
    pub fn is_closed(&self) -> bool {
        self.stage == Stage::Closed
    }

    /// Write the frame header. Does nothing once the header is out.
    pub fn begin(&mut self, out: &mut Vec<u8>) {
        if self.stage != Stage::Unopened {
            return;
        }
        let start = out.len();
        self.descriptor.write_header(out);
        self.total_out += (out.len() - start) as u64;
        self.stage = Stage::Open;
        log::debug!("frame opened: {:?}", self.descriptor);
    }

    /// Accept `input`, appending every block that fills up to `out`.
    pub fn update(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if self.stage == Stage::Closed {
            return Err(Lz4Error::invalid_argument("write to a closed frame"));
        }
        if let Some(declared) = self.descriptor.content_length {
            if self.total_in + input.len() as u64 > declared {
                return Err(Lz4Error::invalid_argument(format!(
                    "content exceeds the declared length of {declared} bytes"
                )));
            }
        }
        self.begin(out);

        let block_size = self.descriptor.block_size.bytes();
        while !input.is_empty() {
            let take = (block_size - self.block.len()).min(input.len());
            self.block.extend_from_slice(&input[..take]);
            self.total_in += take as u64;
            input = &input[take..];
            if self.block.len() == block_size {
                self.emit_block(out)?;
            }
        }
        Ok(())
    }

    /// Emit the partially filled block, if any.
    pub fn flush(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.stage == Stage::Closed {
            return Ok(());
        }
        self.begin(out);
        self.emit_block(out)
    }

    /// Emit the last block and the end marker.
    ///
    /// Closing twice is a no-op. A declared content length that does not
    /// match the bytes written is an [`Lz4Error::InvalidArgument`], raised
    /// before the end marker goes out.
    pub fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        if self.stage == Stage::Closed {
            return Ok(());
        }
        self.begin(out);
        self.emit_block(out)?;
        if let Some(declared) = self.descriptor.content_length {
            if declared != self.total_in {
                return Err(Lz4Error::invalid_argument(format!(
                    "frame declared {declared} bytes of content but {} were written",
                    self.total_in
                )));
            }
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        self.total_out += 4;
        self.stage = Stage::Closed;
        log::debug!(
            "frame closed: {} blocks, {} -> {} bytes",
            self.blocks,
            self.total_in,
            self.total_out
        );
        Ok(())
    }

    fn emit_block(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let len = self.block.len();
        if len == 0 {
            return Ok(());
        }
        // A compressed block must be shorter than its content.
        let limit = len - 1;
        let encoded = self.stream.compress_next(&self.block, &mut self.scratch[..limit]);
        let (word, compressed) = match encoded {
            Ok(n) => (n as u32, true),
            Err(Lz4Error::OutputTooSmall { .. }) => (len as u32 | RAW_BLOCK_FLAG, false),
            Err(err) => return Err(err),
        };
        out.extend_from_slice(&word.to_le_bytes());
        let payload = if compressed {
            &self.scratch[..word as usize]
        } else {
            &self.block[..]
        };
        out.extend_from_slice(payload);
        log::trace!(
            "block {}: {} bytes {}",
            self.blocks,
            len,
            if compressed {
                format!("compressed to {}", payload.len())
            } else {
                "stored raw".to_string()
            }
        );
        self.total_out += 4 + payload.len() as u64;
        self.blocks += 1;
        self.block.clear();
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.pending_pos < self.pending.len()
    }

    fn drain(&mut self, output: &mut [u8]) -> usize {
        let n = (self.pending.len() - self.pending_pos).min(output.len());
        output[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
        self.pending_pos += n;
        n
    }

    /// Run `step` with the (empty) pending buffer as its output.
    fn stage_output<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce(&mut Self, &mut Vec<u8>) -> Result<()>,
    {
        let mut pending = std::mem::take(&mut self.pending);
        pending.clear();
        self.pending_pos = 0;
        let result = step(self, &mut pending);
        self.pending = pending;
        result
    }
}

impl Compressor for FrameEncoder {
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, CompressStatus)> {
        let mut consumed = 0;
        let mut written = self.drain(output);

        loop {
            if self.has_pending() {
                return Ok((consumed, written, CompressStatus::NeedsOutput));
            }
            if self.stage == Stage::Closed {
                return Ok((consumed, written, CompressStatus::Done));
            }

            if consumed < input.len() {
                // One block at a time, so pending never holds more than one.
                let room = self.descriptor.block_size.bytes() - self.block.len();
                let take = room.min(input.len() - consumed);
                let chunk = &input[consumed..consumed + take];
                self.stage_output(|enc, out| enc.update(chunk, out))?;
                consumed += take;
                written += self.drain(&mut output[written..]);
                continue;
            }

            match flush {
                FlushMode::None => return Ok((consumed, written, CompressStatus::NeedsInput)),
                FlushMode::Sync => {
                    self.stage_output(|enc, out| enc.flush(out))?;
                    written += self.drain(&mut output[written..]);
                    let status = if self.has_pending() {
                        CompressStatus::NeedsOutput
                    } else {
                        CompressStatus::NeedsInput
                    };
                    return Ok((consumed, written, status));
                }
                FlushMode::Finish => {
                    self.stage_output(|enc, out| enc.finish(out))?;
                    written += self.drain(&mut output[written..]);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.stream.reset();
        self.stage = Stage::Unopened;
        self.block.clear();
        self.pending.clear();
        self.pending_pos = 0;
        self.total_in = 0;
        self.total_out = 0;
        self.blocks = 0;
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Closed && !self.has_pending()
    }
}
