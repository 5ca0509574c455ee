//! Bench command implementation.

use crate::utils::{create_step_bar, open_input, savings};
use oxilz4::block::{BlockEncoder, decompress_sized};
use oxilz4::CompressionLevel;
use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Result of benchmarking one level.
#[derive(Debug)]
pub struct LevelReport {
    pub level: CompressionLevel,
    pub compressed: usize,
    pub compress_time: Duration,
    pub decompress_time: Duration,
}

/// Deterministic text-like sample used when no input is given.
pub fn sample_data(len: usize) -> Vec<u8> {
    const WORDS: [&str; 16] = [
        "lorem ", "ipsum ", "dolor ", "sit ", "amet ", "block ", "frame ", "match ",
        "offset ", "literal ", "token ", "window ", "chain ", "hash ", "level ", "\n",
    ];
    let mut data = Vec::with_capacity(len + 16);
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    while data.len() < len {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        data.extend_from_slice(WORDS[(seed >> 60) as usize].as_bytes());
    }
    data.truncate(len);
    data
}

/// Compress and decompress `data` at `level`, `iterations` times each.
pub fn run_level(
    data: &[u8],
    level: CompressionLevel,
    iterations: u32,
) -> Result<LevelReport, Box<dyn std::error::Error>> {
    let mut encoder = BlockEncoder::new(level);
    let mut compressed = Vec::new();
    let start = Instant::now();
    for _ in 0..iterations {
        compressed = encoder.compress(data)?;
    }
    let compress_time = start.elapsed() / iterations;

    let mut out = vec![0u8; data.len()];
    let start = Instant::now();
    for _ in 0..iterations {
        decompress_sized(&compressed, &mut out)?;
    }
    let decompress_time = start.elapsed() / iterations;
    if out != data {
        return Err(format!("level {level} did not round-trip").into());
    }

    Ok(LevelReport {
        level,
        compressed: compressed.len(),
        compress_time,
        decompress_time,
    })
}

fn throughput(bytes: usize, time: Duration) -> f64 {
    let secs = time.as_secs_f64();
    if secs == 0.0 {
        f64::INFINITY
    } else {
        bytes as f64 / secs / (1024.0 * 1024.0)
    }
}

pub fn cmd_bench(
    input: Option<&PathBuf>,
    size: usize,
    levels: &[CompressionLevel],
    iterations: u32,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let iterations = iterations.max(1);
    let data = match input {
        Some(path) => {
            let mut data = Vec::new();
            open_input(path)?.read_to_end(&mut data)?;
            data
        }
        None => sample_data(size),
    };
    let source = input.map_or_else(|| "generated sample".to_string(), |p| p.display().to_string());

    let pb = create_step_bar(levels.len() as u64, progress);
    let mut reports = Vec::with_capacity(levels.len());
    for &level in levels {
        pb.set_message(format!("level {level}"));
        reports.push(run_level(&data, level, iterations)?);
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("Benchmark: {source}, {} bytes, {iterations} iteration(s)", data.len());
    println!(
        "{:>5} {:>8} {:>12} {:>7} {:>12} {:>12}",
        "Level", "Strategy", "Compressed", "Saved", "Comp MB/s", "Decomp MB/s"
    );
    println!("{}", "-".repeat(61));
    for report in &reports {
        println!(
            "{:>5} {:>8} {:>12} {:>6.1}% {:>12.1} {:>12.1}",
            report.level.to_string(),
            report.level.strategy().name(),
            report.compressed,
            savings(data.len() as u64, report.compressed as u64),
            throughput(data.len(), report.compress_time),
            throughput(data.len(), report.decompress_time),
        );
    }
    Ok(())
}
