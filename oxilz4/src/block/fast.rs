//! Level 0: single-probe hash table with greedy parsing.
//!
//! Each probe looks up one candidate, replaces it with the current position
//! and accepts the candidate on a 4-byte match. When probes keep failing the
//! step grows (one extra byte every 64 misses), so incompressible input is
//! skipped quickly.

use super::matcher::{HashTable, Window};
use super::sequence::SequenceWriter;
use super::{LAST_LITERALS, MF_LIMIT, MIN_INPUT_LENGTH, MIN_MATCH};
use crate::level::FastParams;
use oxilz4_core::buffer::{common_prefix, peek_u32};
use oxilz4_core::error::Result;

const SKIP_TRIGGER: usize = 6;

pub(super) fn compress(
    table: &mut HashTable,
    params: FastParams,
    w: &Window<'_>,
    start: usize,
    end: usize,
    out: &mut SequenceWriter<'_>,
) -> Result<()> {
    let buf = w.buf;
    let mut anchor = start;
    if end - start < MIN_INPUT_LENGTH {
        return out.last_literals(&buf[start..end]);
    }

    let mflimit = end - MF_LIMIT;
    let match_limit = end - LAST_LITERALS;
    let acceleration = params.acceleration.max(1) as usize;

    let mut ip = start;
    let h = table.hash(buf, ip);
    table.put(h, w.index(ip));
    ip += 1;
    let mut forward_h = table.hash(buf, ip);

    'main: loop {
        let mut forward_ip = ip;
        let mut step = 1;
        let mut search_count = acceleration << SKIP_TRIGGER;

        let mut mpos = loop {
            let h = forward_h;
            ip = forward_ip;
            forward_ip += step;
            step = search_count >> SKIP_TRIGGER;
            search_count += 1;

            if forward_ip > mflimit + 1 {
                break 'main;
            }

            let candidate = table.get(h);
            forward_h = table.hash(buf, forward_ip);
            let ip_index = w.index(ip);
            table.put(h, ip_index);

            if candidate < w.lowest_index(ip_index) || candidate >= ip_index {
                continue;
            }
            let cpos = w.pos(candidate);
            if peek_u32(buf, cpos) == peek_u32(buf, ip) {
                break cpos;
            }
        };

        // Widen over the pending literals.
        while ip > anchor && mpos > w.low && buf[ip - 1] == buf[mpos - 1] {
            ip -= 1;
            mpos -= 1;
        }

        loop {
            let len = MIN_MATCH + common_prefix(buf, mpos + MIN_MATCH, ip + MIN_MATCH, match_limit);
            out.sequence(&buf[anchor..ip], ip - mpos, len)?;
            ip += len;
            anchor = ip;

            if ip > mflimit {
                break 'main;
            }

            let h = table.hash(buf, ip - 2);
            table.put(h, w.index(ip - 2));

            // A match right away means a sequence with no literals.
            let ip_index = w.index(ip);
            let h = table.hash(buf, ip);
            let candidate = table.get(h);
            table.put(h, ip_index);
            if candidate >= w.lowest_index(ip_index)
                && candidate < ip_index
                && peek_u32(buf, w.pos(candidate)) == peek_u32(buf, ip)
            {
                mpos = w.pos(candidate);
                continue;
            }
            break;
        }

        ip += 1;
        forward_h = table.hash(buf, ip);
    }

    out.last_literals(&buf[anchor..end])
}

/// Greedy parse for blocks too short for the regular end-of-block rules.
///
/// Only one trailing literal is reserved, so short runs such as ten equal
/// bytes still shrink. Candidates are searched exhaustively within the block.
pub(super) fn compress_tiny(
    w: &Window<'_>,
    start: usize,
    end: usize,
    out: &mut SequenceWriter<'_>,
) -> Result<()> {
    let buf = w.buf;
    let mut anchor = start;
    let mut ip = start + 1;

    while ip + MIN_MATCH < end {
        let limit = end - 1;
        let mut best_len = 0;
        let mut best_offset = 0;
        for candidate in start..ip {
            let len = common_prefix(buf, candidate, ip, limit);
            if len > best_len {
                best_len = len;
                best_offset = ip - candidate;
            }
        }
        if best_len >= MIN_MATCH {
            out.sequence(&buf[anchor..ip], best_offset, best_len)?;
            ip += best_len;
            anchor = ip;
        } else {
            ip += 1;
        }
    }

    out.last_literals(&buf[anchor..end])
}
