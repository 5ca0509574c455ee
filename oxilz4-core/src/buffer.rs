//! Primitive buffer operations.
//!
//! Little-endian peek/poke helpers, bulk and overlapping copies, and fills.
//! Every function works on bounds-checked slices; callers are expected to
//! have validated positions already, so an out-of-range index is a bug and
//! panics like any other slice index.
//!
//! The overlapping copy is the one that matters: an LZ77 back-reference
//! whose distance is shorter than its length reads bytes it has just
//! written, so it cannot be a `memmove`.

/// Read a little-endian `u16` at `pos`.
#[inline]
pub fn peek_u16(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

/// Read a little-endian `u32` at `pos`.
#[inline]
pub fn peek_u32(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

/// Read a little-endian `u64` at `pos`.
#[inline]
pub fn peek_u64(buf: &[u8], pos: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[pos..pos + 8]);
    u64::from_le_bytes(bytes)
}

/// Write `value` as little-endian at `pos`.
#[inline]
pub fn poke_u16(buf: &mut [u8], pos: usize, value: u16) {
    buf[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

/// Write `value` as little-endian at `pos`.
#[inline]
pub fn poke_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}

/// Write `value` as little-endian at `pos`.
#[inline]
pub fn poke_u64(buf: &mut [u8], pos: usize, value: u64) {
    buf[pos..pos + 8].copy_from_slice(&value.to_le_bytes());
}

/// Copy `len` bytes from `src` into `dst` at `dst_pos`.
#[inline]
pub fn block_copy(dst: &mut [u8], dst_pos: usize, src: &[u8]) {
    dst[dst_pos..dst_pos + src.len()].copy_from_slice(src);
}

/// Replay `len` bytes starting `distance` bytes behind `pos`, writing at `pos`.
///
/// Works for any `distance >= 1`, including `distance < len` where the source
/// and destination overlap (distance 1 degenerates to a byte fill). The
/// caller guarantees `distance <= pos` and `pos + len <= buf.len()`.
#[inline]
pub fn wild_copy(buf: &mut [u8], pos: usize, distance: usize, len: usize) {
    debug_assert!(distance >= 1 && distance <= pos);
    let src = pos - distance;
    if distance >= len {
        buf.copy_within(src..src + len, pos);
    } else if distance == 1 {
        let byte = buf[src];
        buf[pos..pos + len].fill(byte);
    } else {
        // Each pass doubles the replicated run, so the copy stays
        // non-overlapping within a pass.
        let mut copied = 0;
        let mut step = distance;
        while copied < len {
            let chunk = step.min(len - copied);
            buf.copy_within(src..src + chunk, pos + copied);
            copied += chunk;
            step = copied + distance;
        }
    }
}

/// Fill `len` bytes at `pos` with `value`.
#[inline]
pub fn fill(buf: &mut [u8], pos: usize, len: usize, value: u8) {
    buf[pos..pos + len].fill(value);
}

/// Zero `len` bytes at `pos`.
#[inline]
pub fn zero(buf: &mut [u8], pos: usize, len: usize) {
    fill(buf, pos, len, 0);
}

/// Count equal leading bytes of `buf[a..]` and `buf[b..]`, stopping at `limit`
/// (an exclusive bound on `b + count`). Requires `a < b`.
#[inline]
pub fn common_prefix(buf: &[u8], a: usize, b: usize, limit: usize) -> usize {
    let mut len = 0;
    // Word-at-a-time while eight bytes are available on both sides.
    while b + len + 8 <= limit {
        let diff = peek_u64(buf, a + len) ^ peek_u64(buf, b + len);
        if diff != 0 {
            return len + (diff.trailing_zeros() / 8) as usize;
        }
        len += 8;
    }
    while b + len < limit && buf[a + len] == buf[b + len] {
        len += 1;
    }
    len
}

/// Count equal bytes walking backwards from `a` and `b` (exclusive), without
/// going below `a_low` / `b_low`.
#[inline]
pub fn common_suffix(buf: &[u8], a: usize, b: usize, a_low: usize, b_low: usize) -> usize {
    let mut back = 0;
    while a - back > a_low && b - back > b_low && buf[a - back - 1] == buf[b - back - 1] {
        back += 1;
    }
    back
}
