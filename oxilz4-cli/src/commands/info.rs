//! Info command implementation.

use crate::utils::savings;
use oxilz4::frame::{FrameDescriptor, read_frame_descriptor};
use oxilz4_core::buffer::peek_u32;
use serde::Serialize;
use std::path::Path;

/// Summary of one frame, as printed by `oxilz4 info`.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    pub file: String,
    pub file_size: u64,
    pub block_size: usize,
    pub block_chaining: bool,
    pub block_checksum: bool,
    pub content_checksum: bool,
    pub content_size: Option<u64>,
    pub dictionary_id: Option<u32>,
    pub header_len: usize,
    pub blocks: usize,
    pub raw_blocks: usize,
    pub frame_len: Option<usize>,
    pub trailing_bytes: usize,
}

impl FrameInfo {
    /// Describe the first frame of `data`. Block boundaries are walked, but
    /// block contents are not decoded.
    pub fn scan(file: &str, data: &[u8]) -> oxilz4::Result<Self> {
        let (desc, header_len) = read_frame_descriptor(data)?;
        let (blocks, raw_blocks, frame_len) = walk_blocks(&desc, data, header_len);
        Ok(Self {
            file: file.to_string(),
            file_size: data.len() as u64,
            block_size: desc.block_size.bytes(),
            block_chaining: desc.block_chaining,
            block_checksum: desc.block_checksum,
            content_checksum: desc.content_checksum,
            content_size: desc.content_length,
            dictionary_id: desc.dictionary_id,
            header_len,
            blocks,
            raw_blocks,
            frame_len,
            trailing_bytes: frame_len.map_or(0, |len| data.len() - len),
        })
    }
}

/// Count blocks; the frame length is `None` if the frame is cut short.
fn walk_blocks(
    desc: &FrameDescriptor,
    data: &[u8],
    mut pos: usize,
) -> (usize, usize, Option<usize>) {
    let checksum_len = if desc.block_checksum { 4 } else { 0 };
    let mut blocks = 0;
    let mut raw = 0;
    while pos + 4 <= data.len() {
        let word = peek_u32(data, pos);
        pos += 4;
        if word == 0 {
            let end = pos + if desc.content_checksum { 4 } else { 0 };
            return (blocks, raw, (end <= data.len()).then_some(end));
        }
        blocks += 1;
        if word & 0x8000_0000 != 0 {
            raw += 1;
        }
        pos += (word & 0x7FFF_FFFF) as usize + checksum_len;
    }
    (blocks, raw, None)
}

pub fn cmd_info(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(file)?;
    let info = FrameInfo::scan(&file.display().to_string(), &data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Frame Information");
    println!("=================");
    println!("File: {}", info.file);
    println!("Size: {} bytes", info.file_size);
    println!("Block size: {} bytes", info.block_size);
    println!(
        "Blocks: {} ({})",
        info.blocks,
        if info.block_chaining { "chained" } else { "independent" }
    );
    println!("Stored raw: {}", info.raw_blocks);
    println!("Block checksums: {}", yes_no(info.block_checksum));
    println!("Content checksum: {}", yes_no(info.content_checksum));
    if let Some(id) = info.dictionary_id {
        println!("Dictionary id: {id:#010x}");
    }
    match info.content_size {
        Some(size) => {
            println!("Content size: {size} bytes");
            println!(
                "Compression ratio: {:.1}%",
                savings(size, info.frame_len.unwrap_or(data.len()) as u64)
            );
        }
        None => println!("Content size: not recorded"),
    }
    match info.frame_len {
        Some(len) if info.trailing_bytes > 0 => {
            println!("Frame length: {len} bytes ({} bytes follow)", info.trailing_bytes)
        }
        Some(len) => println!("Frame length: {len} bytes"),
        None => println!("Frame length: truncated"),
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
