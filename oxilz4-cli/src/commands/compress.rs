//! Compress command implementation.

use crate::utils::{
    compressed_name, create_output, create_progress_bar, input_len, open_input, savings,
};
use clap::ValueEnum;
use oxilz4::envelope;
use oxilz4::frame::{BlockSize, FrameSettings, FrameWriter};
use oxilz4::CompressionLevel;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Block size choices on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum BlockSizeArg {
    /// 64 KiB
    #[default]
    #[value(name = "64k")]
    K64,
    /// 256 KiB
    #[value(name = "256k")]
    K256,
    /// 1 MiB
    #[value(name = "1m")]
    M1,
    /// 4 MiB
    #[value(name = "4m")]
    M4,
}

impl From<BlockSizeArg> for BlockSize {
    fn from(arg: BlockSizeArg) -> Self {
        match arg {
            BlockSizeArg::K64 => BlockSize::Max64KB,
            BlockSizeArg::K256 => BlockSize::Max256KB,
            BlockSizeArg::M1 => BlockSize::Max1MB,
            BlockSizeArg::M4 => BlockSize::Max4MB,
        }
    }
}

/// Options of `oxilz4 compress`.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub level: CompressionLevel,
    pub block_size: BlockSizeArg,
    pub independent: bool,
    pub extra_memory: usize,
    pub content_size: bool,
    pub envelope: bool,
    pub force: bool,
    pub progress: bool,
    pub verbose: bool,
}

pub fn cmd_compress(
    input: &Path,
    output: Option<&PathBuf>,
    options: &CompressOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.cloned().unwrap_or_else(|| compressed_name(input));
    let len = input_len(input);

    let (read, written) = if options.envelope {
        compress_envelope(input, &output, options)?
    } else {
        compress_frame(input, &output, len, options)?
    };

    if options.verbose {
        eprintln!(
            "{}: {} -> {} bytes ({:.1}% saved)",
            input.display(),
            read,
            written,
            savings(read, written)
        );
    }
    Ok(())
}

fn compress_frame(
    input: &Path,
    output: &Path,
    len: Option<u64>,
    options: &CompressOptions,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let mut settings = FrameSettings::new()
        .with_level(options.level)
        .with_block_size(options.block_size.into())
        .with_chaining(!options.independent)
        .with_extra_memory(options.extra_memory);
    if options.content_size {
        let len = len.ok_or("--content-size needs a regular input file")?;
        settings = settings.with_content_length(len);
    }
    log::debug!("compressing {} with {settings:?}", input.display());

    let pb = create_progress_bar(len.unwrap_or(0), options.progress && len.is_some());
    let mut reader = pb.wrap_read(open_input(input)?);
    let mut writer = FrameWriter::with_settings(create_output(output, options.force)?, &settings)?;
    let read = io::copy(&mut reader, &mut writer)?;
    writer.close()?;
    pb.finish_and_clear();
    Ok((read, writer.total_out()))
}

fn compress_envelope(
    input: &Path,
    output: &Path,
    options: &CompressOptions,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let mut data = Vec::new();
    open_input(input)?.read_to_end(&mut data)?;
    let packed = envelope::compress(&data, options.level)?;
    let mut writer = create_output(output, options.force)?;
    writer.write_all(&packed)?;
    writer.flush()?;
    Ok((data.len() as u64, packed.len() as u64))
}
