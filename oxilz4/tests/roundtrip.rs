//! Round-trip tests across levels, data patterns and APIs.

use oxilz4::block::{
    BlockEncoder, compress_block, compress_block_into, compress_bound, decompress_block,
    decompress_sized,
};
use oxilz4::envelope;
use oxilz4::frame::{BlockSize, FrameSettings, compress_frame, decompress_frame};
use oxilz4::{CompressionLevel, Lz4Error};

const LEVELS: [u8; 11] = [0, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

fn levels() -> impl Iterator<Item = CompressionLevel> {
    LEVELS
        .iter()
        .map(|&l| CompressionLevel::new(l).expect("valid level"))
}

/// Deterministic pseudo-random bytes.
fn noise(len: usize, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 24) as u8
        })
        .collect()
}

fn text(len: usize) -> Vec<u8> {
    let words = noise(len / 3 + 1, 17);
    let mut data = Vec::with_capacity(len + 16);
    for w in words {
        let word = match w % 8 {
            0 => "compress ",
            1 => "block ",
            2 => "frame ",
            3 => "match ",
            4 => "literal ",
            5 => "offset ",
            6 => "token\n",
            _ => "window ",
        };
        data.extend_from_slice(word.as_bytes());
        if data.len() >= len {
            break;
        }
    }
    data.truncate(len);
    data
}

fn samples() -> Vec<(&'static str, Vec<u8>)> {
    let mut mixed = text(40_000);
    mixed.extend(noise(20_000, 5));
    mixed.extend(vec![0u8; 30_000]);
    mixed.extend(text(10_000));
    vec![
        ("empty", Vec::new()),
        ("one byte", vec![42]),
        ("twelve bytes", b"abcdabcdabcd".to_vec()),
        ("thirteen bytes", b"abcdabcdabcda".to_vec()),
        ("zeros", vec![0u8; 100_000]),
        ("period two", b"ab".repeat(40_000)),
        ("text", text(150_000)),
        ("noise", noise(70_000, 3)),
        ("mixed", mixed),
    ]
}

#[test]
fn test_block_roundtrip_all_levels() {
    for level in levels() {
        let mut encoder = BlockEncoder::new(level);
        for (name, data) in samples() {
            let block = encoder.compress(&data).expect("compress");
            assert!(block.len() <= compress_bound(data.len()), "{name} at {level}");
            let decoded = decompress_block(&block, data.len()).expect("decompress");
            assert_eq!(decoded, data, "{name} at {level}");

            let mut exact = vec![0u8; data.len()];
            assert_eq!(decompress_sized(&block, &mut exact).ok(), Some(data.len()));
        }
    }
}

#[test]
fn test_frame_roundtrip_all_levels() {
    for level in levels() {
        for (name, data) in samples() {
            let settings = FrameSettings::new().with_level(level);
            let frame = compress_frame(&data, &settings).expect("compress");
            assert_eq!(decompress_frame(&frame).expect("decompress"), data, "{name} at {level}");
        }
    }
}

#[test]
fn test_envelope_roundtrip_all_levels() {
    for level in levels() {
        for (name, data) in samples() {
            let packed = envelope::compress(&data, level).expect("compress");
            assert!(packed.len() <= compress_bound(data.len()), "{name} at {level}");
            assert!(packed.len() <= data.len() + 1, "{name} at {level}");
            assert_eq!(envelope::expand(&packed).expect("expand"), data, "{name} at {level}");
        }
    }
}

#[test]
fn test_ten_byte_run() {
    let data = b"aaaaaaaaaa";
    let block = compress_block(data, CompressionLevel::FAST).expect("compress");
    assert!(block.len() < data.len());
    assert_eq!(decompress_block(&block, data.len()).expect("decompress"), data);
}

#[test]
fn test_every_block_size() {
    let data = text(5 * 1024 * 1024 + 123);
    for block_size in BlockSize::ALL {
        let settings = FrameSettings::new()
            .with_block_size(block_size)
            .with_content_length(data.len() as u64);
        let frame = compress_frame(&data, &settings).expect("compress");
        assert_eq!(decompress_frame(&frame).expect("decompress"), data, "{block_size}");
    }
}

#[test]
fn test_bounded_output() {
    let data = text(10_000);
    let needed = compress_block(&data, CompressionLevel::FAST)
        .expect("compress")
        .len();

    let mut exact = vec![0u8; needed];
    assert_eq!(
        compress_block_into(&data, &mut exact, CompressionLevel::FAST).ok(),
        Some(needed)
    );

    let mut short = vec![0u8; needed - 1];
    assert!(matches!(
        compress_block_into(&data, &mut short, CompressionLevel::FAST),
        Err(Lz4Error::OutputTooSmall { .. })
    ));
}

#[test]
fn test_levels_trade_ratio() {
    let data = text(200_000);
    let fast = compress_block(&data, CompressionLevel::FAST).expect("compress");
    let hc = compress_block(&data, CompressionLevel::DEFAULT_HC).expect("compress");
    let optimal = compress_block(&data, CompressionLevel::MAX).expect("compress");
    assert!(hc.len() < fast.len());
    assert!(optimal.len() < fast.len());
}
