//! Match engine: position indexes over the history window.
//!
//! Positions are tracked as stream-absolute `u32` indices. Index 0 is never
//! a real position (the first byte of a stream sits at [`START_INDEX`]), so
//! a zeroed table means "empty". A candidate is usable only when it lies in
//! the valid window and at most [`MAX_DISTANCE`] bytes behind the current
//! position. Long streams renormalize indices by a multiple of 64 KiB so the
//! chain table, indexed by the low 16 bits, stays consistent.

use super::{MAX_DISTANCE, MIN_MATCH};
use oxilz4_core::buffer::{common_prefix, common_suffix, peek_u32, peek_u64};

/// Index of the first byte of a fresh stream.
pub(crate) const START_INDEX: u32 = 1 << 16;

/// Chain table size: one 16-bit back-delta per position in a 64 KiB window.
const CHAIN_SIZE: usize = 1 << 16;
const CHAIN_MASK: u32 = (CHAIN_SIZE - 1) as u32;

/// Hash-chain head table size.
const HC_HASH_LOG: u32 = 15;

/// Fast encoder table size.
pub(crate) const FAST_HASH_LOG: u32 = 12;

/// Inputs at least this long use the 5-byte hash in the fast encoder.
const HASH5_THRESHOLD: usize = 64 * 1024;

/// A view of the history buffer the encoders search.
///
/// `buf[low..]` holds valid history, and `buf[p]` has index `base + p`.
#[derive(Clone, Copy)]
pub(crate) struct Window<'a> {
    pub buf: &'a [u8],
    pub base: u32,
    pub low: usize,
}

impl Window<'_> {
    #[inline]
    pub fn index(&self, pos: usize) -> u32 {
        self.base + pos as u32
    }

    #[inline]
    pub fn pos(&self, index: u32) -> usize {
        (index - self.base) as usize
    }

    /// Lowest index a match for `index` may reference.
    #[inline]
    pub fn lowest_index(&self, index: u32) -> u32 {
        self.index(self.low).max(index.saturating_sub(MAX_DISTANCE as u32))
    }
}

/// A match found by a search: `len` bytes starting `back` bytes before the
/// probed position, `offset` bytes behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Match {
    pub len: usize,
    pub offset: usize,
    pub back: usize,
}

impl Match {
    pub const NONE: Self = Self {
        len: 0,
        offset: 0,
        back: 0,
    };
}

#[inline]
fn hash4(sequence: u32, log: u32) -> usize {
    (sequence.wrapping_mul(2_654_435_761) >> (32 - log)) as usize
}

#[inline]
fn hash5(sequence: u64, log: u32) -> usize {
    ((sequence << 24).wrapping_mul(889_523_592_379) >> (64 - log)) as usize
}

/// Which prefix the fast table hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HashWidth {
    Four,
    Five,
}

impl HashWidth {
    pub fn for_input(len: usize) -> Self {
        if len >= HASH5_THRESHOLD {
            HashWidth::Five
        } else {
            HashWidth::Four
        }
    }
}

/// Single-slot hash table used by the fast encoder.
pub(crate) struct HashTable {
    entries: Vec<u32>,
    log: u32,
    width: HashWidth,
}

impl HashTable {
    pub fn new(log: u32) -> Self {
        Self {
            entries: vec![0; 1 << log],
            log,
            width: HashWidth::Four,
        }
    }

    pub fn reset(&mut self, width: HashWidth) {
        self.entries.fill(0);
        self.width = width;
    }

    /// Hash of the bytes at `pos`. The 5-byte hash reads eight bytes, which
    /// the encoder guarantees by never hashing past the match-find limit.
    #[inline]
    pub fn hash(&self, buf: &[u8], pos: usize) -> usize {
        match self.width {
            HashWidth::Four => hash4(peek_u32(buf, pos), self.log),
            HashWidth::Five => hash5(peek_u64(buf, pos), self.log),
        }
    }

    #[inline]
    pub fn get(&self, hash: usize) -> u32 {
        self.entries[hash]
    }

    #[inline]
    pub fn put(&mut self, hash: usize, index: u32) {
        self.entries[hash] = index;
    }

    pub fn renormalize(&mut self, delta: u32) {
        for entry in &mut self.entries {
            *entry = entry.saturating_sub(delta);
        }
    }
}

/// Hash heads plus a 64K ring of 16-bit back-deltas.
pub(crate) struct HashChain {
    head: Vec<u32>,
    chain: Vec<u16>,
    next_to_update: u32,
}

/// Outcome of the repeated-pattern probe for the current search.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Untested,
    Confirmed,
    Rejected,
}

impl HashChain {
    pub fn new() -> Self {
        Self {
            head: vec![0; 1 << HC_HASH_LOG],
            chain: vec![u16::MAX; CHAIN_SIZE],
            next_to_update: START_INDEX,
        }
    }

    /// Forget all positions; indexing resumes at `start`.
    pub fn reset(&mut self, start: u32) {
        self.head.fill(0);
        self.chain.fill(u16::MAX);
        self.next_to_update = start;
    }

    pub fn renormalize(&mut self, delta: u32) {
        for entry in &mut self.head {
            *entry = entry.saturating_sub(delta);
        }
        self.next_to_update = self.next_to_update.saturating_sub(delta);
    }

    #[inline]
    fn delta(&self, index: u32) -> u32 {
        u32::from(self.chain[(index & CHAIN_MASK) as usize])
    }

    /// Index every position up to and including `target`.
    pub fn insert(&mut self, w: &Window<'_>, target: u32) {
        let mut index = self.next_to_update.max(w.index(w.low));
        while index <= target {
            let h = hash4(peek_u32(w.buf, w.pos(index)), HC_HASH_LOG);
            let delta = (index - self.head[h]).min(u32::from(u16::MAX));
            self.chain[(index & CHAIN_MASK) as usize] = delta as u16;
            self.head[h] = index;
            index += 1;
        }
        self.next_to_update = index;
    }

    /// Longest match at `pos` ending at or before `limit`.
    pub fn find_best(
        &mut self,
        w: &Window<'_>,
        pos: usize,
        limit: usize,
        attempts: u32,
        pattern_analysis: bool,
    ) -> Match {
        self.find_longer(w, pos, limit, MIN_MATCH - 1, attempts, pattern_analysis)
    }

    /// Match at `pos` strictly longer than `min_len`, or [`Match::NONE`].
    pub fn find_longer(
        &mut self,
        w: &Window<'_>,
        pos: usize,
        limit: usize,
        min_len: usize,
        attempts: u32,
        pattern_analysis: bool,
    ) -> Match {
        let m = self.find_wider(w, pos, pos, limit, min_len, attempts, pattern_analysis);
        if m.len > min_len && m.offset != 0 { m } else { Match::NONE }
    }

    /// Search for a match at `pos` longer than `longest`, allowing it to
    /// extend backwards down to `low_limit`.
    ///
    /// The result's `len` counts the backward extension. When nothing beats
    /// `longest`, the returned match has `len == longest` and `offset == 0`.
    #[allow(clippy::too_many_arguments)]
    pub fn find_wider(
        &mut self,
        w: &Window<'_>,
        pos: usize,
        low_limit: usize,
        limit: usize,
        longest: usize,
        attempts: u32,
        pattern_analysis: bool,
    ) -> Match {
        let buf = w.buf;
        let ip_index = w.index(pos);
        let lowest = w.lowest_index(ip_index);
        let look_back = pos - low_limit;
        let pattern = peek_u32(buf, pos);

        self.insert(w, ip_index);

        let mut best = Match {
            len: longest,
            offset: 0,
            back: 0,
        };
        let mut repeat = Repeat::Untested;
        let mut src_pattern_len = 0;
        let mut remaining = attempts;
        let mut match_index = ip_index - self.delta(ip_index);

        while match_index >= lowest && match_index < ip_index && remaining > 0 {
            remaining -= 1;
            let mpos = w.pos(match_index);

            // Cheap reject: the byte that would extend the current best.
            let probe = best.len.saturating_sub(1);
            let plausible = mpos < look_back
                || low_limit + probe + 1 >= limit
                || buf[low_limit + probe] == buf[mpos - look_back + probe];

            if plausible && peek_u32(buf, mpos) == pattern {
                let back = if look_back > 0 {
                    common_suffix(buf, mpos, pos, w.low, low_limit)
                } else {
                    0
                };
                let len = MIN_MATCH + common_prefix(buf, mpos + MIN_MATCH, pos + MIN_MATCH, limit);
                if len + back > best.len {
                    best = Match {
                        len: len + back,
                        offset: (ip_index - match_index) as usize,
                        back,
                    };
                }
            }

            let step = self.delta(match_index);
            if pattern_analysis && step == 1 {
                if repeat == Repeat::Untested {
                    repeat = if is_repeating(pattern) {
                        src_pattern_len = count_pattern(buf, pos + 4, limit, pattern) + 4;
                        Repeat::Confirmed
                    } else {
                        Repeat::Rejected
                    };
                }
                if repeat == Repeat::Confirmed && match_index > lowest {
                    let candidate = match_index - 1;
                    let cpos = w.pos(candidate);
                    if peek_u32(buf, cpos) == pattern {
                        let forward = count_pattern(buf, cpos + 4, limit, pattern) + 4;
                        let backward = reverse_count_pattern(buf, cpos, w.low, pattern)
                            .min((candidate - lowest) as usize);
                        let segment = backward + forward;
                        if segment >= src_pattern_len && forward <= src_pattern_len {
                            // Align the candidate with the end of the run.
                            match_index = candidate + forward as u32 - src_pattern_len as u32;
                        } else {
                            match_index = candidate - backward as u32;
                            if look_back == 0 {
                                let max_len = segment.min(src_pattern_len);
                                if best.len < max_len {
                                    if ip_index - match_index > MAX_DISTANCE as u32 {
                                        break;
                                    }
                                    best = Match {
                                        len: max_len,
                                        offset: (ip_index - match_index) as usize,
                                        back: 0,
                                    };
                                }
                                let skip = self.delta(match_index);
                                if skip > match_index {
                                    break;
                                }
                                match_index -= skip;
                            }
                        }
                        continue;
                    }
                }
            }

            if step > match_index {
                break;
            }
            match_index -= step;
        }

        best
    }
}

/// True when `pattern` is a single repeated byte.
#[inline]
fn is_repeating(pattern: u32) -> bool {
    (pattern & 0xFFFF) == (pattern >> 16) && (pattern & 0xFF) == (pattern >> 24)
}

/// Count bytes from `pos` that continue the 4-byte `pattern`, up to `limit`.
fn count_pattern(buf: &[u8], pos: usize, limit: usize, pattern: u32) -> usize {
    let bytes = pattern.to_le_bytes();
    let mut n = 0;
    while pos + n < limit && buf[pos + n] == bytes[n & 3] {
        n += 1;
    }
    n
}

/// Count bytes before `pos` that continue the pattern backwards, down to `low`.
fn reverse_count_pattern(buf: &[u8], pos: usize, low: usize, pattern: u32) -> usize {
    let bytes = pattern.to_le_bytes();
    let mut n = 0;
    while pos - n > low && buf[pos - n - 1] == bytes[3 - (n & 3)] {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(buf: &[u8]) -> Window<'_> {
        Window {
            buf,
            base: START_INDEX,
            low: 0,
        }
    }

    #[test]
    fn test_find_best_simple_repeat() {
        let buf = b"abcdefgh__abcdefgh__0123456789";
        let w = window(buf);
        let mut chain = HashChain::new();
        let m = chain.find_best(&w, 10, buf.len() - 5, 16, false);
        assert_eq!(m.offset, 10);
        assert_eq!(m.len, 10);
    }

    #[test]
    fn test_find_best_none() {
        let buf = b"0123456789abcdefghijklmnop";
        let w = window(buf);
        let mut chain = HashChain::new();
        assert_eq!(chain.find_best(&w, 12, buf.len() - 5, 16, false), Match::NONE);
    }

    #[test]
    fn test_find_wider_extends_backwards() {
        let buf = b"xxQRSTabcdefyyQRSTabcdefzzzzzzzzzz";
        let w = window(buf);
        let mut chain = HashChain::new();
        // Probe at "abcdef" in the second copy, allow extension back to 'y'.
        let m = chain.find_wider(&w, 18, 14, buf.len() - 5, 3, 16, false);
        assert_eq!(m.offset, 12);
        assert_eq!(m.back, 4);
        assert_eq!(m.len, 10);
    }

    #[test]
    fn test_window_distance_limit() {
        let mut buf = vec![0u8; 70_000];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i * 7 % 251) as u8;
        }
        buf[..8].copy_from_slice(b"SENTINEL");
        let far = buf.len() - 20;
        buf[far..far + 8].copy_from_slice(b"SENTINEL");
        let w = window(&buf);
        let mut chain = HashChain::new();
        let m = chain.find_best(&w, far, buf.len() - 5, 1 << 12, false);
        assert!(m.offset <= MAX_DISTANCE);
    }

    #[test]
    fn test_pattern_analysis_finds_run() {
        let mut buf = vec![b'z'; 600];
        buf[0] = b'a';
        let w = window(&buf);
        let mut chain = HashChain::new();
        let limit = buf.len() - 5;
        let m = chain.find_wider(&w, 400, 400, limit, 3, 256, true);
        assert!(m.len >= limit - 400);
        let src = 400 - m.offset;
        assert!(buf[src..src + m.len].iter().all(|&b| b == b'z'));
    }

    #[test]
    fn test_hash_table_renormalize() {
        let mut table = HashTable::new(FAST_HASH_LOG);
        table.put(3, START_INDEX + 10);
        table.put(4, 5);
        table.renormalize(START_INDEX);
        assert_eq!(table.get(3), 10);
        assert_eq!(table.get(4), 0);
    }

    #[test]
    fn test_pattern_helpers() {
        assert!(!is_repeating(u32::from_le_bytes(*b"abab")));
        assert!(is_repeating(u32::from_le_bytes(*b"aaaa")));
        assert!(!is_repeating(u32::from_le_bytes(*b"abcd")));
        let buf = b"xyababababQ";
        let pat = u32::from_le_bytes(*b"abab");
        assert_eq!(count_pattern(buf, 2, buf.len(), pat), 8);
        assert_eq!(reverse_count_pattern(buf, 6, 0, pat), 4);
    }
}
