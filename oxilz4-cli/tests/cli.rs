//! End-to-end tests of the `oxilz4` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn oxilz4(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oxilz4"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run oxilz4")
}

fn sample() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..20_000u32 {
        let line = format!("line {} of the sample, checksum {}\n", i, i * 31 % 17);
        data.extend_from_slice(line.as_bytes());
    }
    data
}

#[test]
fn test_compress_decompress_roundtrip() {
    let dir = TempDir::new().expect("tempdir");
    let data = sample();
    fs::write(dir.path().join("data.txt"), &data).expect("write");

    let out = oxilz4(&["compress", "-l", "9", "data.txt"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let compressed = fs::read(dir.path().join("data.txt.lz4")).expect("compressed file");
    assert!(compressed.len() < data.len() / 3);
    assert_eq!(&compressed[..4], &[0x04, 0x22, 0x4D, 0x18]);

    fs::remove_file(dir.path().join("data.txt")).expect("remove");
    let out = oxilz4(&["decompress", "data.txt.lz4"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(dir.path().join("data.txt")).expect("restored"), data);
}

#[test]
fn test_refuses_overwrite_without_force() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a.bin"), b"aaaaaaaaaaaaaaaaaaaaaaaa").expect("write");
    fs::write(dir.path().join("a.bin.lz4"), b"keep me").expect("write");

    let out = oxilz4(&["compress", "a.bin"], dir.path());
    assert!(!out.status.success());
    assert_eq!(fs::read(dir.path().join("a.bin.lz4")).expect("read"), b"keep me");

    let out = oxilz4(&["compress", "--force", "a.bin"], dir.path());
    assert!(out.status.success());
}

#[test]
fn test_integrity_check() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("d"), sample()).expect("write");
    let out = oxilz4(&["compress", "--content-size", "d", "-o", "good.lz4"], dir.path());
    assert!(out.status.success());

    let mut bad = fs::read(dir.path().join("good.lz4")).expect("read");
    let last = bad.len() - 5;
    bad.truncate(last);
    fs::write(dir.path().join("bad.lz4"), &bad).expect("write");

    let out = oxilz4(&["test", "good.lz4"], dir.path());
    assert!(out.status.success());
    let out = oxilz4(&["test", "good.lz4", "bad.lz4"], dir.path());
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("OK: good.lz4"));
    assert!(stdout.contains("FAILED: bad.lz4"));
}

#[test]
fn test_info_json() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("d"), sample()).expect("write");
    let out = oxilz4(
        &["compress", "--independent", "-B", "256k", "--content-size", "d"],
        dir.path(),
    );
    assert!(out.status.success());

    let out = oxilz4(&["info", "--json", "d.lz4"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("\"block_size\": 262144"));
    assert!(stdout.contains("\"block_chaining\": false"));
    assert!(stdout.contains(&format!("\"content_size\": {}", sample().len())));
}

#[test]
fn test_envelope_mode() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("small"), b"aaaaaaaaaa").expect("write");
    let out = oxilz4(&["compress", "--envelope", "small", "-o", "small.env"], dir.path());
    assert!(out.status.success());
    assert!(fs::read(dir.path().join("small.env")).expect("read").len() < 10);

    let out = oxilz4(
        &["decompress", "--envelope", "small.env", "-o", "small.out"],
        dir.path(),
    );
    assert!(out.status.success());
    assert_eq!(fs::read(dir.path().join("small.out")).expect("read"), b"aaaaaaaaaa");
}

#[test]
fn test_invalid_level_rejected() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("d"), b"data").expect("write");
    let out = oxilz4(&["compress", "-l", "2", "d"], dir.path());
    assert!(!out.status.success());
    assert!(!dir.path().join("d.lz4").exists());
}

#[test]
fn test_concatenated_frames() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("a"), b"first ").expect("write");
    fs::write(dir.path().join("b"), b"second").expect("write");
    assert!(oxilz4(&["compress", "a"], dir.path()).status.success());
    assert!(oxilz4(&["compress", "b"], dir.path()).status.success());

    let mut joined = fs::read(dir.path().join("a.lz4")).expect("read");
    joined.extend(fs::read(dir.path().join("b.lz4")).expect("read"));
    fs::write(dir.path().join("ab.lz4"), joined).expect("write");

    let out = oxilz4(&["decompress", "ab.lz4"], dir.path());
    assert!(out.status.success());
    assert_eq!(fs::read(dir.path().join("ab")).expect("read"), b"first second");
}

#[test]
fn test_bench_small_sample() {
    let dir = TempDir::new().expect("tempdir");
    let out = oxilz4(
        &["bench", "--size", "100000", "-l", "0", "-l", "9", "-n", "1", "--no-progress"],
        dir.path(),
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("fast"));
    assert!(stdout.contains("hc"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().expect("tempdir");
    let out = oxilz4(&["completions", "bash"], dir.path());
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("oxilz4"));
}
