//! Decompress command implementation.

use crate::utils::{create_output, decompressed_name, open_input, savings};
use oxilz4::envelope;
use oxilz4::frame::FrameReader;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

pub fn cmd_decompress(
    input: &Path,
    output: Option<&PathBuf>,
    use_envelope: bool,
    force: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.cloned().unwrap_or_else(|| decompressed_name(input));
    if output == input && !crate::utils::is_stdio(input) {
        return Err(format!("refusing to overwrite {} with itself", input.display()).into());
    }

    let mut writer = create_output(&output, force)?;
    let (read, written) = if use_envelope {
        let mut packed = Vec::new();
        open_input(input)?.read_to_end(&mut packed)?;
        let data = envelope::expand(&packed)?;
        writer.write_all(&data)?;
        (packed.len() as u64, data.len() as u64)
    } else {
        decode_frames(open_input(input)?, &mut writer)?
    };
    writer.flush()?;

    if verbose {
        eprintln!(
            "{}: {} -> {} bytes ({:.1}% saved)",
            input.display(),
            read,
            written,
            savings(written, read)
        );
    }
    Ok(())
}

/// Decode every frame in `input`, one after another, into `output`.
///
/// Returns (frame bytes read, decoded bytes written).
pub fn decode_frames<R: Read, W: Write>(
    input: R,
    output: &mut W,
) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let mut input = BufReader::new(input);
    let mut read = 0;
    let mut written = 0;
    let mut frames = 0u32;
    loop {
        let mut frame = FrameReader::new(&mut input)?;
        written += io::copy(&mut frame, output)?;
        read += frame.total_in();
        frames += 1;
        if input.fill_buf()?.is_empty() {
            break;
        }
    }
    log::debug!("decoded {frames} frame(s)");
    Ok((read, written))
}
