//! `std::io::Write` adapter over [`FrameEncoder`].

use super::encoder::FrameEncoder;
use super::settings::FrameSettings;
use oxilz4_core::error::{Lz4Error, Result};
use std::io::{self, Write};

/// Writes an LZ4 frame to an underlying writer.
///
/// The header is written when the writer is created. Dropping the writer
/// closes the frame; call [`FrameWriter::close`] or [`FrameWriter::finish`]
/// to see errors from that last step.
///
/// # Example
///
/// ```rust
/// use oxilz4::frame::{FrameReader, FrameWriter};
/// use std::io::{Read, Write};
///
/// let mut writer = FrameWriter::new(Vec::new()).unwrap();
/// writer.write_all(b"Hello, Hello, Hello, World!").unwrap();
/// let frame = writer.finish().unwrap();
///
/// let mut reader = FrameReader::new(&frame[..]).unwrap();
/// let mut text = String::new();
/// reader.read_to_string(&mut text).unwrap();
/// assert_eq!(text, "Hello, Hello, Hello, World!");
/// ```
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    inner: Option<W>,
    encoder: FrameEncoder,
    out: Vec<u8>,
    leave_open: bool,
    closed: bool,
}

impl<W: Write> FrameWriter<W> {
    /// Open a frame with default settings.
    pub fn new(inner: W) -> Result<Self> {
        Self::with_settings(inner, &FrameSettings::default())
    }

    /// Open a frame with `settings`; the header goes out immediately.
    pub fn with_settings(inner: W, settings: &FrameSettings) -> Result<Self> {
        let mut writer = Self {
            inner: Some(inner),
            encoder: FrameEncoder::new(settings)?,
            out: Vec::with_capacity(settings.block_size.bytes() + 4),
            leave_open: settings.leave_open,
            closed: false,
        };
        writer.encoder.begin(&mut writer.out);
        writer.write_out()?;
        Ok(writer)
    }

    /// The underlying writer, unless it was released by [`FrameWriter::close`].
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    /// Mutable access to the underlying writer.
    pub fn get_mut(&mut self) -> Option<&mut W> {
        self.inner.as_mut()
    }

    /// Uncompressed bytes written so far.
    pub fn total_in(&self) -> u64 {
        self.encoder.total_in()
    }

    /// Frame bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.encoder.total_out()
    }

    fn transport(&mut self) -> Result<&mut W> {
        self.inner
            .as_mut()
            .ok_or_else(|| Lz4Error::invalid_argument("frame writer is closed"))
    }

    fn write_out(&mut self) -> Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        let out = std::mem::take(&mut self.out);
        let result = self
            .transport()
            .and_then(|w| w.write_all(&out).map_err(Lz4Error::from));
        self.out = out;
        self.out.clear();
        result
    }

    fn end_frame(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.encoder.finish(&mut self.out)?;
        self.write_out()?;
        self.transport()?.flush()?;
        Ok(())
    }

    /// Finish the frame. The underlying writer is dropped unless the
    /// settings asked to leave it open. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let result = self.end_frame();
        if !self.leave_open {
            self.inner = None;
        }
        result
    }

    /// Finish the frame and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.end_frame()?;
        self.inner
            .take()
            .ok_or_else(|| Lz4Error::invalid_argument("frame writer is closed"))
    }
}

impl<W: Write> Write for FrameWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(Lz4Error::invalid_argument("write to a closed frame").into());
        }
        self.encoder.update(buf, &mut self.out)?;
        self.write_out()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.encoder.flush(&mut self.out)?;
        self.write_out()?;
        self.transport()?.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for FrameWriter<W> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.end_frame() {
                log::warn!("closing LZ4 frame on drop failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decompress_frame;

    #[test]
    fn test_drop_closes_frame() {
        let mut sink = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut sink).expect("open");
            writer.write_all(b"dropped without close").expect("write");
        }
        assert_eq!(decompress_frame(&sink).ok(), Some(b"dropped without close".to_vec()));
    }

    #[test]
    fn test_close_is_idempotent() {
        let settings = FrameSettings::new().with_leave_open(true);
        let mut writer = FrameWriter::with_settings(Vec::new(), &settings).expect("open");
        writer.write_all(b"abc").expect("write");
        writer.close().expect("first close");
        writer.close().expect("second close");
        let len = writer.get_ref().map(Vec::len);
        assert_eq!(len, Some(7 + 4 + 3 + 4));
        assert!(writer.write(b"more").is_err());
    }

    #[test]
    fn test_close_releases_transport() {
        let mut writer = FrameWriter::new(Vec::new()).expect("open");
        writer.close().expect("close");
        assert!(writer.get_ref().is_none());
    }

    #[test]
    fn test_flush_emits_partial_block() {
        let mut writer = FrameWriter::new(Vec::new()).expect("open");
        writer.write_all(b"partial").expect("write");
        assert_eq!(writer.get_ref().map(Vec::len), Some(7));
        writer.flush().expect("flush");
        assert_eq!(writer.get_ref().map(Vec::len), Some(7 + 4 + 7));
        let frame = writer.finish().expect("finish");
        assert_eq!(decompress_frame(&frame).ok(), Some(b"partial".to_vec()));
    }
}
