//! LZ4 frame format.
//!
//! A frame is a self-describing stream: a header carrying the
//! [`FrameDescriptor`], a sequence of length-prefixed blocks and a
//! zero-length end marker.
//!
//! ```text
//! magic | FLG BD [content size] [dict id] HC | block* | 0u32 [content checksum]
//! block: u32 length (MSB = stored raw) | payload | [u32 block checksum]
//! ```
//!
//! [`FrameEncoder`] and [`FrameDecoder`] are transport-free state machines;
//! [`FrameWriter`] and [`FrameReader`] drive them over `std::io`.
//!
//! The encoder never produces checksums or dictionary ids and refuses
//! settings that ask for them. The decoder verifies block and content
//! checksums written by other encoders.

mod decoder;
mod descriptor;
mod encoder;
mod reader;
mod settings;
mod writer;

pub use decoder::FrameDecoder;
pub use descriptor::{BlockSize, FRAME_MAGIC, FrameDescriptor, MAX_HEADER_LEN};
pub use encoder::FrameEncoder;
pub use reader::FrameReader;
pub use settings::{Feature, FrameSettings, MAX_EXTRA_MEMORY};
pub use writer::FrameWriter;

use crate::block::compress_bound;
use oxilz4_core::error::{Lz4Error, Result};
use oxilz4_core::traits::{DecompressStatus, Decompressor};

/// Compress `data` into a complete frame.
pub fn compress_frame(data: &[u8], settings: &FrameSettings) -> Result<Vec<u8>> {
    let mut encoder = FrameEncoder::new(settings)?;
    let mut out = Vec::with_capacity(MAX_HEADER_LEN + compress_bound(data.len()) + 4);
    encoder.update(data, &mut out)?;
    encoder.finish(&mut out)?;
    Ok(out)
}

/// Decompress the frame at the start of `data`.
///
/// Bytes after the end of the frame are ignored.
pub fn decompress_frame(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = FrameDecoder::new();
    let mut out = Vec::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut pos = 0;
    loop {
        let (consumed, produced, status) = decoder.decompress(&data[pos..], &mut buf)?;
        pos += consumed;
        out.extend_from_slice(&buf[..produced]);
        match status {
            DecompressStatus::Done => break,
            DecompressStatus::NeedsInput if pos >= data.len() => {
                return Err(Lz4Error::unexpected_eof(decoder.bytes_needed()));
            }
            DecompressStatus::NeedsInput | DecompressStatus::NeedsOutput => {}
        }
    }
    if pos < data.len() {
        log::debug!("ignoring {} bytes after the end of the frame", data.len() - pos);
    }
    Ok(out)
}

/// Read the frame header at the start of `data`.
///
/// Returns the descriptor and the header length.
pub fn read_frame_descriptor(data: &[u8]) -> Result<(FrameDescriptor, usize)> {
    FrameDescriptor::read(data)
}
