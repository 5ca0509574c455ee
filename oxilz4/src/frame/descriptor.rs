//! Frame header: magic number, descriptor and header checksum.
//!
//! ```text
//! u32 magic            0x184D2204, little-endian
//! u8  FLG              [7:6] version (01) [5] block independence
//!                      [4] block checksum [3] content size
//!                      [2] content checksum [1] reserved [0] dictionary id
//! u8  BD               [6:4] block size code, other bits reserved
//! u64 content size     only if FLG[3]
//! u32 dictionary id    only if FLG[0]
//! u8  header checksum  (xxh32(FLG..) >> 8) & 0xFF
//! ```

use oxilz4_core::buffer::{peek_u32, peek_u64};
use oxilz4_core::checksum::header_checksum;
use oxilz4_core::error::{Lz4Error, Result};
use std::fmt;

/// Frame magic number.
pub const FRAME_MAGIC: u32 = 0x184D_2204;

const FLG_VERSION_MASK: u8 = 0xC0;
const FLG_VERSION: u8 = 0x40;
const FLG_BLOCK_INDEPENDENCE: u8 = 0x20;
const FLG_BLOCK_CHECKSUM: u8 = 0x10;
const FLG_CONTENT_SIZE: u8 = 0x08;
const FLG_CONTENT_CHECKSUM: u8 = 0x04;
const FLG_RESERVED: u8 = 0x02;
const FLG_DICT_ID: u8 = 0x01;
const BD_RESERVED: u8 = 0x8F;

/// Longest possible header: magic, FLG, BD, content size, dictionary id, checksum.
pub const MAX_HEADER_LEN: usize = 4 + 2 + 8 + 4 + 1;

/// Maximum block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum BlockSize {
    /// 64 KiB blocks.
    #[default]
    Max64KB = 4,
    /// 256 KiB blocks.
    Max256KB = 5,
    /// 1 MiB blocks.
    Max1MB = 6,
    /// 4 MiB blocks.
    Max4MB = 7,
}

impl BlockSize {
    /// All sizes, smallest first.
    pub const ALL: [BlockSize; 4] = [
        BlockSize::Max64KB,
        BlockSize::Max256KB,
        BlockSize::Max1MB,
        BlockSize::Max4MB,
    ];

    /// Size in bytes.
    pub fn bytes(self) -> usize {
        match self {
            BlockSize::Max64KB => 64 * 1024,
            BlockSize::Max256KB => 256 * 1024,
            BlockSize::Max1MB => 1024 * 1024,
            BlockSize::Max4MB => 4 * 1024 * 1024,
        }
    }

    /// The 3-bit BD code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Size for a BD code, if the code is defined.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            4 => Some(BlockSize::Max64KB),
            5 => Some(BlockSize::Max256KB),
            6 => Some(BlockSize::Max1MB),
            7 => Some(BlockSize::Max4MB),
            _ => None,
        }
    }

    /// Size for an exact byte count; anything but the four canonical sizes
    /// is an [`Lz4Error::InvalidArgument`].
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.bytes() == bytes)
            .ok_or_else(|| {
                Lz4Error::invalid_argument(format!(
                    "block size {bytes} is not one of 64 KiB, 256 KiB, 1 MiB, 4 MiB"
                ))
            })
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSize::Max64KB => write!(f, "64 KiB"),
            BlockSize::Max256KB => write!(f, "256 KiB"),
            BlockSize::Max1MB => write!(f, "1 MiB"),
            BlockSize::Max4MB => write!(f, "4 MiB"),
        }
    }
}

/// Frame parameters as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameDescriptor {
    /// Declared length of the decoded content.
    pub content_length: Option<u64>,
    /// A content checksum follows the end marker.
    pub content_checksum: bool,
    /// Blocks may reference data of earlier blocks.
    pub block_chaining: bool,
    /// Each block is followed by its checksum.
    pub block_checksum: bool,
    /// Identifier of a preset dictionary.
    pub dictionary_id: Option<u32>,
    /// Maximum decoded size of one block.
    pub block_size: BlockSize,
}

impl FrameDescriptor {
    /// FLG byte.
    pub fn flg(&self) -> u8 {
        let mut flg = FLG_VERSION;
        if !self.block_chaining {
            flg |= FLG_BLOCK_INDEPENDENCE;
        }
        if self.block_checksum {
            flg |= FLG_BLOCK_CHECKSUM;
        }
        if self.content_length.is_some() {
            flg |= FLG_CONTENT_SIZE;
        }
        if self.content_checksum {
            flg |= FLG_CONTENT_CHECKSUM;
        }
        if self.dictionary_id.is_some() {
            flg |= FLG_DICT_ID;
        }
        flg
    }

    /// BD byte.
    pub fn bd(&self) -> u8 {
        self.block_size.code() << 4
    }

    /// Encoded header length, magic and checksum included.
    pub fn header_len(&self) -> usize {
        4 + 2 + optional_len(self.flg()) + 1
    }

    /// Append the encoded header to `out`.
    pub fn write_header(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&FRAME_MAGIC.to_le_bytes());
        let start = out.len();
        out.push(self.flg());
        out.push(self.bd());
        if let Some(len) = self.content_length {
            out.extend_from_slice(&len.to_le_bytes());
        }
        if let Some(id) = self.dictionary_id {
            out.extend_from_slice(&id.to_le_bytes());
        }
        let checksum = header_checksum(&out[start..]);
        out.push(checksum);
    }

    /// Parse the descriptor fields that follow the magic number: FLG, BD,
    /// optional fields and the checksum byte. `at` is the stream offset of
    /// FLG, used in error reports.
    pub(crate) fn decode(fields: &[u8], at: u64) -> Result<Self> {
        let (flg, bd) = (fields[0], fields[1]);
        let block_size = check_flags(flg, bd, at)?;
        let body_len = 2 + optional_len(flg);
        if fields.len() != body_len + 1 {
            return Err(Lz4Error::invalid_argument("descriptor length does not match FLG"));
        }

        let stored = fields[body_len];
        let computed = header_checksum(&fields[..body_len]);
        if stored != computed {
            return Err(Lz4Error::checksum_mismatch(
                "header checksum",
                at + body_len as u64,
                u32::from(stored),
                u32::from(computed),
            ));
        }

        let mut pos = 2;
        let content_length = if flg & FLG_CONTENT_SIZE != 0 {
            pos += 8;
            Some(peek_u64(fields, pos - 8))
        } else {
            None
        };
        let dictionary_id = if flg & FLG_DICT_ID != 0 {
            Some(peek_u32(fields, pos))
        } else {
            None
        };

        Ok(Self {
            content_length,
            content_checksum: flg & FLG_CONTENT_CHECKSUM != 0,
            block_chaining: flg & FLG_BLOCK_INDEPENDENCE == 0,
            block_checksum: flg & FLG_BLOCK_CHECKSUM != 0,
            dictionary_id,
            block_size,
        })
    }

    /// Read the header at the start of `data`.
    ///
    /// Returns the descriptor and the header length.
    pub fn read(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 6 {
            return Err(Lz4Error::unexpected_eof(6 - data.len()));
        }
        check_magic(peek_u32(data, 0), 0)?;
        let fields_len = descriptor_fields_len(data[4], data[5], 4)?;
        let header_len = 4 + fields_len;
        if data.len() < header_len {
            return Err(Lz4Error::unexpected_eof(header_len - data.len()));
        }
        let descriptor = Self::decode(&data[4..header_len], 4)?;
        Ok((descriptor, header_len))
    }
}

/// Bytes of optional fields announced by FLG.
pub(crate) fn optional_len(flg: u8) -> usize {
    let mut len = 0;
    if flg & FLG_CONTENT_SIZE != 0 {
        len += 8;
    }
    if flg & FLG_DICT_ID != 0 {
        len += 4;
    }
    len
}

pub(crate) fn check_magic(magic: u32, at: u64) -> Result<()> {
    if magic != FRAME_MAGIC {
        return Err(Lz4Error::corrupted(
            at,
            format!("bad magic number {magic:#010x}, expected {FRAME_MAGIC:#010x}"),
        ));
    }
    Ok(())
}

/// Validate FLG and BD; returns the block size.
pub(crate) fn check_flags(flg: u8, bd: u8, at: u64) -> Result<BlockSize> {
    if flg & FLG_VERSION_MASK != FLG_VERSION {
        return Err(Lz4Error::unsupported(format!(
            "frame format version {}",
            flg >> 6
        )));
    }
    if flg & FLG_RESERVED != 0 {
        return Err(Lz4Error::corrupted(at, "reserved FLG bit set"));
    }
    if bd & BD_RESERVED != 0 {
        return Err(Lz4Error::corrupted(at + 1, "reserved BD bits set"));
    }
    let code = (bd >> 4) & 0x07;
    BlockSize::from_code(code)
        .ok_or_else(|| Lz4Error::corrupted(at + 1, format!("invalid block size code {code}")))
}

/// Length of FLG, BD, optional fields and checksum, after validating FLG/BD.
pub(crate) fn descriptor_fields_len(flg: u8, bd: u8, at: u64) -> Result<usize> {
    check_flags(flg, bd, at)?;
    Ok(2 + optional_len(flg) + 1)
}
