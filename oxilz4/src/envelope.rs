//! Single-shot envelope: one block behind a minimal header.
//!
//! ```text
//! u8 flags          [2:0] version (0) [5:3] reserved [7:6] delta size code
//! u8|u16|u32 delta  original length - stored length, absent for code 0
//! payload           a compressed block, or the input verbatim when delta is 0
//! ```
//!
//! Size codes 0, 1, 2 and 3 mean 0, 1, 2 and 4 delta bytes.

use crate::block::{BlockEncoder, MAX_INPUT_SIZE, decompress_partial, decompress_sized};
use crate::level::CompressionLevel;
use oxilz4_core::error::{Lz4Error, Result};

const VERSION: u8 = 0;
const VERSION_MASK: u8 = 0x07;
const RESERVED_MASK: u8 = 0x38;
const SIZE_SHIFT: u32 = 6;
const DELTA_SIZES: [usize; 4] = [0, 1, 2, 4];

/// Compress `data` into an envelope.
///
/// Input that does not shrink is stored verbatim, so the result is never
/// more than one byte longer than `data`.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_with(&mut BlockEncoder::new(level), data)
}

/// Compress `data` into an envelope, reusing `encoder`.
pub fn compress_with(encoder: &mut BlockEncoder, data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(vec![VERSION]);
    }

    let mut block = vec![0u8; data.len() - 1];
    let stored = match encoder.compress_into(data, &mut block) {
        Ok(n) => n,
        Err(Lz4Error::OutputTooSmall { .. }) => {
            log::trace!("envelope: {} bytes stored verbatim", data.len());
            let mut out = Vec::with_capacity(1 + data.len());
            out.push(VERSION);
            out.extend_from_slice(data);
            return Ok(out);
        }
        Err(err) => return Err(err),
    };

    let delta = data.len() - stored;
    let code: u8 = match delta {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        _ => 3,
    };
    let width = DELTA_SIZES[usize::from(code)];
    let mut out = Vec::with_capacity(1 + width + stored);
    out.push(VERSION | (code << SIZE_SHIFT));
    out.extend_from_slice(&(delta as u32).to_le_bytes()[..width]);
    out.extend_from_slice(&block[..stored]);
    log::trace!("envelope: {} -> {} bytes", data.len(), out.len());
    Ok(out)
}

/// Parsed envelope header.
struct Header {
    len: usize,
    delta: usize,
}

fn read_header(data: &[u8]) -> Result<Header> {
    let Some(&flags) = data.first() else {
        return Err(Lz4Error::unexpected_eof(1));
    };
    let version = flags & VERSION_MASK;
    if version != VERSION {
        return Err(Lz4Error::unsupported(format!("envelope version {version}")));
    }
    if flags & RESERVED_MASK != 0 {
        return Err(Lz4Error::corrupted(0, "reserved envelope flag bits set"));
    }

    let width = DELTA_SIZES[usize::from(flags >> SIZE_SHIFT)];
    let len = 1 + width;
    if data.len() < len {
        return Err(Lz4Error::unexpected_eof(len - data.len()));
    }
    let mut bytes = [0u8; 4];
    bytes[..width].copy_from_slice(&data[1..len]);
    let delta = u32::from_le_bytes(bytes) as usize;
    if width > 0 && delta == 0 {
        return Err(Lz4Error::corrupted(1, "zero length delta"));
    }
    Ok(Header { len, delta })
}

/// Longest output one block byte can stand for.
const MAX_EXPANSION: usize = 255;

fn original_len(header: &Header, payload: &[u8]) -> Result<usize> {
    if header.delta > payload.len().saturating_mul(MAX_EXPANSION) {
        return Err(Lz4Error::corrupted(
            1,
            format!(
                "length delta {} is impossible for a {} byte payload",
                header.delta,
                payload.len()
            ),
        ));
    }
    let len = payload.len() + header.delta;
    if len > MAX_INPUT_SIZE {
        return Err(Lz4Error::corrupted(
            1,
            format!("declared length {len} exceeds {MAX_INPUT_SIZE}"),
        ));
    }
    Ok(len)
}

/// Restore the bytes held by an envelope.
///
/// The payload must decode to exactly the declared length.
pub fn expand(data: &[u8]) -> Result<Vec<u8>> {
    let header = read_header(data)?;
    let payload = &data[header.len..];
    if header.delta == 0 {
        return Ok(payload.to_vec());
    }

    let mut out = vec![0u8; original_len(&header, payload)?];
    decompress_sized(payload, &mut out).map_err(|err| match err {
        Lz4Error::OutputTooSmall { .. } => {
            Lz4Error::corrupted(header.len as u64, "payload overruns the declared length")
        }
        other => other.rebased(header.len as u64),
    })?;
    Ok(out)
}

/// Restore at most the first `n` bytes held by an envelope.
///
/// Decoding stops once `n` bytes are out, so a damaged tail past that point
/// goes unnoticed.
pub fn peek(data: &[u8], n: usize) -> Result<Vec<u8>> {
    let header = read_header(data)?;
    let payload = &data[header.len..];
    if header.delta == 0 {
        return Ok(payload[..n.min(payload.len())].to_vec());
    }

    let target = n.min(original_len(&header, payload)?);
    let mut out = vec![0u8; target];
    let produced = decompress_partial(payload, &mut out, target)
        .map_err(|err| err.rebased(header.len as u64))?;
    out.truncate(produced);
    Ok(out)
}
