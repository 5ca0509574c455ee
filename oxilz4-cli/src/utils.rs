//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Suffix of compressed files.
pub const LZ4_EXTENSION: &str = "lz4";

/// Create a byte progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Create a step progress bar (levels, iterations).
pub fn create_step_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Whether `path` names a standard stream.
pub fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Open an input file, or stdin for `-`.
pub fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if is_stdio(path) {
        Ok(Box::new(BufReader::new(io::stdin().lock())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Size of an input file; unknown for stdin.
pub fn input_len(path: &Path) -> Option<u64> {
    if is_stdio(path) {
        None
    } else {
        std::fs::metadata(path).ok().map(|m| m.len())
    }
}

/// Create an output file, or stdout for `-`. Existing files are only
/// replaced with `force`.
pub fn create_output(path: &Path, force: bool) -> io::Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    if path.exists() && !force {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        ));
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

/// Default output of `compress`: the input with `.lz4` appended.
pub fn compressed_name(input: &Path) -> PathBuf {
    if is_stdio(input) {
        return input.to_path_buf();
    }
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(LZ4_EXTENSION);
    PathBuf::from(name)
}

/// Default output of `decompress`: the input without `.lz4`, or with `.out`
/// appended when it has another extension.
pub fn decompressed_name(input: &Path) -> PathBuf {
    if is_stdio(input) {
        return input.to_path_buf();
    }
    match input.extension() {
        Some(ext) if ext == LZ4_EXTENSION => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

/// Space saved, in percent.
pub fn savings(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        (1.0 - compressed as f64 / original as f64) * 100.0
    }
}
