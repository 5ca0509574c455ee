//! `std::io::Read` adapter over [`FrameDecoder`].

use super::decoder::FrameDecoder;
use super::descriptor::FrameDescriptor;
use super::settings::FrameSettings;
use oxilz4_core::error::{Lz4Error, Result};
use oxilz4_core::traits::{DecompressStatus, Decompressor};
use std::io::{self, Read};

const INPUT_BUFFER: usize = 64 * 1024;

/// Reads decoded bytes from an LZ4 frame.
///
/// The header is read and validated when the reader is created. The reader
/// only pulls the bytes each field needs from the transport, so it stops
/// exactly at the end of the frame.
#[derive(Debug)]
pub struct FrameReader<R: Read> {
    inner: Option<R>,
    decoder: FrameDecoder,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    leave_open: bool,
}

impl<R: Read> FrameReader<R> {
    /// Open a frame with default settings.
    pub fn new(inner: R) -> Result<Self> {
        Self::with_settings(inner, &FrameSettings::default())
    }

    /// Open a frame, taking the extra memory hint and leave-open flag from
    /// `settings`.
    pub fn with_settings(inner: R, settings: &FrameSettings) -> Result<Self> {
        let mut reader = Self {
            inner: Some(inner),
            decoder: FrameDecoder::with_extra_memory(settings.extra_memory)?,
            buf: vec![0u8; INPUT_BUFFER],
            pos: 0,
            filled: 0,
            leave_open: settings.leave_open,
        };
        while !reader.decoder.header_parsed() {
            reader.fill()?;
            let (consumed, _, _) = reader
                .decoder
                .decompress(&reader.buf[reader.pos..reader.filled], &mut [])?;
            reader.pos += consumed;
        }
        Ok(reader)
    }

    /// The frame descriptor.
    pub fn descriptor(&self) -> Option<&FrameDescriptor> {
        self.decoder.descriptor()
    }

    /// Frame bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.decoder.total_in()
    }

    /// Decoded bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.decoder.total_out()
    }

    /// The underlying reader, unless it was released by [`FrameReader::close`].
    pub fn get_ref(&self) -> Option<&R> {
        self.inner.as_ref()
    }

    /// Stop reading. The underlying reader is dropped unless the settings
    /// asked to leave it open.
    pub fn close(&mut self) {
        if !self.leave_open {
            self.inner = None;
        }
    }

    /// Hand back the underlying reader.
    pub fn into_inner(self) -> Option<R> {
        self.inner
    }

    /// Pull at most the bytes the decoder needs next.
    fn fill(&mut self) -> Result<()> {
        let needed = self.decoder.bytes_needed();
        let want = needed.clamp(1, self.buf.len());
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| Lz4Error::invalid_argument("frame reader is closed"))?;
        let n = loop {
            match inner.read(&mut self.buf[..want]) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        };
        if n == 0 {
            return Err(Lz4Error::unexpected_eof(needed));
        }
        self.pos = 0;
        self.filled = n;
        Ok(())
    }
}

impl<R: Read> Read for FrameReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let (consumed, produced, status) = self
                .decoder
                .decompress(&self.buf[self.pos..self.filled], buf)?;
            self.pos += consumed;
            if produced > 0 || status == DecompressStatus::Done {
                return Ok(produced);
            }
            self.fill()?;
        }
    }
}
