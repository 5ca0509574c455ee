//! Malformed, truncated and checksum-carrying frames.

use oxilz4::envelope;
use oxilz4::frame::{FrameReader, FrameSettings, compress_frame, decompress_frame};
use oxilz4::{CompressionLevel, Lz4Error};
use oxilz4_core::buffer::peek_u32;
use oxilz4_core::checksum::{header_checksum, xxhash32};
use std::io::{ErrorKind, Read};

const FLG_BLOCK_CHECKSUM: u8 = 0x10;
const FLG_CONTENT_SIZE: u8 = 0x08;
const FLG_CONTENT_CHECKSUM: u8 = 0x04;
const FLG_DICT_ID: u8 = 0x01;

fn sample(len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len + 32);
    let mut i = 0u32;
    while data.len() < len {
        data.extend_from_slice(format!("entry {} value {}; ", i % 97, i % 13).as_bytes());
        i += 1;
    }
    data.truncate(len);
    data
}

fn frame_of(data: &[u8]) -> Vec<u8> {
    compress_frame(data, &FrameSettings::new()).expect("compress")
}

/// Rewrite a frame with a default 7-byte header so that it carries the
/// checksums the reference tool can add.
fn with_checksums(frame: &[u8], data: &[u8], block: bool, content: bool) -> Vec<u8> {
    let mut flg = frame[4];
    if block {
        flg |= FLG_BLOCK_CHECKSUM;
    }
    if content {
        flg |= FLG_CONTENT_CHECKSUM;
    }
    let mut out = frame[..4].to_vec();
    out.extend_from_slice(&[flg, frame[5], header_checksum(&[flg, frame[5]])]);

    let mut pos = 7;
    loop {
        let word = peek_u32(frame, pos);
        out.extend_from_slice(&frame[pos..pos + 4]);
        pos += 4;
        if word == 0 {
            break;
        }
        let len = (word & 0x7FFF_FFFF) as usize;
        let payload = &frame[pos..pos + len];
        out.extend_from_slice(payload);
        if block {
            out.extend_from_slice(&xxhash32(payload).to_le_bytes());
        }
        pos += len;
    }
    if content {
        out.extend_from_slice(&xxhash32(data).to_le_bytes());
    }
    out
}

/// Replace the descriptor fields of a frame, fixing up the checksum byte.
fn with_descriptor(frame: &[u8], old_len: usize, fields: &[u8]) -> Vec<u8> {
    let mut out = frame[..4].to_vec();
    out.extend_from_slice(fields);
    out.push(header_checksum(fields));
    out.extend_from_slice(&frame[4 + old_len + 1..]);
    out
}

// ============================================================================
// Header
// ============================================================================

#[test]
fn test_magic_flips_are_corrupt() {
    let frame = frame_of(b"some data");
    for i in 0..4 {
        for bit in [0x01u8, 0x80] {
            let mut bad = frame.clone();
            bad[i] ^= bit;
            let err = decompress_frame(&bad).expect_err("bad magic");
            assert!(err.is_corrupt(), "byte {i}: {err}");
        }
    }
}

#[test]
fn test_header_checksum_flip_is_corrupt() {
    let frame = frame_of(b"some data");
    for bit in 0..8 {
        let mut bad = frame.clone();
        bad[6] ^= 1 << bit;
        assert!(decompress_frame(&bad).is_err_and(|e| e.is_corrupt()));
    }
    // The descriptor bytes themselves are covered too.
    let mut bad = frame.clone();
    bad[4] ^= 0x20;
    assert!(decompress_frame(&bad).is_err_and(|e| e.is_corrupt()));
}

#[test]
fn test_unknown_version_unsupported() {
    let frame = frame_of(b"x");
    for version in [0x00u8, 0x80, 0xC0] {
        let flg = (frame[4] & 0x3F) | version;
        let bad = with_descriptor(&frame, 2, &[flg, frame[5]]);
        assert!(matches!(
            decompress_frame(&bad),
            Err(Lz4Error::UnsupportedFeature { .. })
        ));
    }
}

#[test]
fn test_reserved_bits_corrupt() {
    let frame = frame_of(b"x");
    let bad = with_descriptor(&frame, 2, &[frame[4] | 0x02, frame[5]]);
    assert!(decompress_frame(&bad).is_err_and(|e| e.is_corrupt()));
    let bad = with_descriptor(&frame, 2, &[frame[4], frame[5] | 0x01]);
    assert!(decompress_frame(&bad).is_err_and(|e| e.is_corrupt()));
    let bad = with_descriptor(&frame, 2, &[frame[4], 0x30]);
    assert!(decompress_frame(&bad).is_err_and(|e| e.is_corrupt()));
}

#[test]
fn test_dictionary_frames_unsupported() {
    let frame = frame_of(b"x");
    let mut fields = vec![frame[4] | FLG_DICT_ID, frame[5]];
    fields.extend_from_slice(&0xABCD_u32.to_le_bytes());
    let bad = with_descriptor(&frame, 2, &fields);
    assert!(matches!(
        decompress_frame(&bad),
        Err(Lz4Error::UnsupportedFeature { .. })
    ));
}

#[test]
fn test_encoder_refuses_unimplemented_features() {
    for settings in [
        FrameSettings::new().with_content_checksum(true),
        FrameSettings::new().with_block_checksum(true),
        FrameSettings::new().with_dictionary_id(1),
    ] {
        assert!(matches!(
            compress_frame(b"data", &settings),
            Err(Lz4Error::UnsupportedFeature { .. })
        ));
    }
}

// ============================================================================
// Truncation
// ============================================================================

#[test]
fn test_every_truncation_is_unexpected_eof() {
    let data = sample(5000);
    let frame = frame_of(&data);
    for cut in 0..frame.len() {
        let err = decompress_frame(&frame[..cut]).expect_err("truncated");
        assert!(err.is_truncated(), "cut {cut}: {err}");
    }
}

#[test]
fn test_reader_truncation_is_unexpected_eof() {
    let data = sample(100_000);
    let frame = frame_of(&data);
    let cut = frame.len() / 2;
    let mut reader = FrameReader::new(&frame[..cut]).expect("header intact");
    let mut out = Vec::new();
    let err = reader.read_to_end(&mut out).expect_err("truncated");
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

// ============================================================================
// Blocks
// ============================================================================

#[test]
fn test_bad_match_offset_is_corrupt() {
    let mut frame = frame_of(b"");
    frame.truncate(7);
    // One literal, then a match reaching 2 bytes back.
    let block = [0x10, b'a', 0x02, 0x00, 0x50, b'b', b'c', b'd', b'e', b'f'];
    frame.extend_from_slice(&(block.len() as u32).to_le_bytes());
    frame.extend_from_slice(&block);
    frame.extend_from_slice(&[0, 0, 0, 0]);
    let err = decompress_frame(&frame).expect_err("bad offset");
    assert!(err.is_corrupt());
}

#[test]
fn test_oversized_block_length_is_corrupt() {
    let mut frame = frame_of(b"");
    frame.truncate(7);
    frame.extend_from_slice(&(64 * 1024 + 1u32).to_le_bytes());
    assert!(decompress_frame(&frame).is_err_and(|e| e.is_corrupt()));
}

#[test]
fn test_full_size_compressed_block_is_corrupt() {
    let mut frame = frame_of(b"");
    frame.truncate(7);
    frame.extend_from_slice(&(64 * 1024u32).to_le_bytes());
    frame.extend_from_slice(&vec![0u8; 64 * 1024]);
    frame.extend_from_slice(&0u32.to_le_bytes());
    assert!(decompress_frame(&frame).is_err_and(|e| e.is_corrupt()));

    // The same length is fine for a raw block.
    frame[7..11].copy_from_slice(&(64 * 1024u32 | 0x8000_0000).to_le_bytes());
    assert_eq!(decompress_frame(&frame).expect("raw block"), vec![0u8; 64 * 1024]);
}

#[test]
fn test_declared_length_mismatch_is_corrupt() {
    let data = sample(1000);
    let frame = compress_frame(&data, &FrameSettings::new().with_content_length(1000))
        .expect("compress");
    let mut fields = vec![frame[4], frame[5]];
    assert_ne!(fields[0] & FLG_CONTENT_SIZE, 0);
    fields.extend_from_slice(&1001u64.to_le_bytes());
    let bad = with_descriptor(&frame, 10, &fields);
    assert!(decompress_frame(&bad).is_err_and(|e| e.is_corrupt()));
}

// ============================================================================
// Checksums
// ============================================================================

#[test]
fn test_checksummed_frames_verify() {
    let data = sample(300_000);
    let frame = frame_of(&data);
    for (block, content) in [(true, false), (false, true), (true, true)] {
        let checked = with_checksums(&frame, &data, block, content);
        assert_eq!(decompress_frame(&checked).expect("valid checksums"), data);
    }
}

#[test]
fn test_block_checksum_mismatch() {
    let data = sample(10_000);
    let mut checked = with_checksums(&frame_of(&data), &data, true, false);
    // Last byte of the block checksum, just before the end marker.
    let at = checked.len() - 5;
    checked[at] ^= 0x40;
    let err = decompress_frame(&checked).expect_err("bad block checksum");
    assert!(err.is_corrupt());
    assert!(err.to_string().contains("block checksum"));
}

#[test]
fn test_content_checksum_catches_payload_damage() {
    let data = sample(10_000);
    let mut checked = with_checksums(&frame_of(&data), &data, false, true);
    // Second byte of the first block.
    checked[12] ^= 0x01;
    assert!(decompress_frame(&checked).is_err_and(|e| e.is_corrupt()));

    let mut checked = with_checksums(&frame_of(&data), &data, false, true);
    let last = checked.len() - 1;
    checked[last] ^= 0x01;
    let err = decompress_frame(&checked).expect_err("bad content checksum");
    assert!(err.to_string().contains("content checksum"));
}

#[test]
fn test_reader_surfaces_corruption() {
    let data = sample(10_000);
    let mut checked = with_checksums(&frame_of(&data), &data, true, false);
    checked[12] ^= 0x01;
    let mut reader = FrameReader::new(&checked[..]).expect("header intact");
    let mut out = Vec::new();
    let err = reader.read_to_end(&mut out).expect_err("corrupt");
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(Lz4Error::from_io(err).is_corrupt());
}

// ============================================================================
// Envelope
// ============================================================================

#[test]
fn test_envelope_truncated_payload_is_corrupt() {
    let data = sample(5000);
    let packed = envelope::compress(&data, CompressionLevel::FAST).expect("compress");
    for cut in [packed.len() - 1, packed.len() / 2, 4] {
        assert!(envelope::expand(&packed[..cut]).is_err_and(|e| e.is_corrupt()), "cut {cut}");
    }
}

#[test]
fn test_envelope_impossible_delta_is_corrupt() {
    // Four-byte delta of about 2 GB over a two-byte block.
    let packed = [0xC0, 0xF0, 0xFF, 0xFF, 0x7D, 0x10, b'a'];
    assert!(envelope::expand(&packed).is_err_and(|e| e.is_corrupt()));
    assert!(envelope::peek(&packed, 1 << 20).is_err_and(|e| e.is_corrupt()));

    // A long run legitimately needs a large delta.
    let data = vec![b'z'; 1 << 20];
    let packed = envelope::compress(&data, CompressionLevel::FAST).expect("compress");
    assert_eq!(envelope::expand(&packed).expect("expand"), data);
}
