//! Levels 3-9: hash chains with lazy match selection.
//!
//! For every match found, the encoder looks for an overlapping longer match
//! a little further on (two more positions deep). Overlapping candidates are
//! trimmed against each other so each emitted match stays at least
//! [`MIN_MATCH`] bytes, preferring to keep short matches near
//! [`OPTIMAL_ML`] where their token cost is flat.

use super::matcher::{HashChain, Match, Window};
use super::sequence::SequenceWriter;
use super::{LAST_LITERALS, MF_LIMIT, MIN_INPUT_LENGTH, MIN_MATCH};
use crate::level::HcParams;
use oxilz4_core::error::Result;

/// Longest match whose length still fits the token nibble.
const OPTIMAL_ML: usize = 15 + MIN_MATCH - 1;

#[derive(Clone, Copy)]
enum Lazy {
    /// Look for a second match overlapping the first.
    Second,
    /// Look for a third match overlapping the second.
    Third,
}

#[inline]
fn emit(
    out: &mut SequenceWriter<'_>,
    buf: &[u8],
    anchor: &mut usize,
    ip: usize,
    m: Match,
) -> Result<usize> {
    out.sequence(&buf[*anchor..ip], m.offset, m.len)?;
    *anchor = ip + m.len;
    Ok(*anchor)
}

pub(super) fn compress(
    chain: &mut HashChain,
    params: HcParams,
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
    let attempts = params.nb_searches;
    let patterns = params.pattern_analysis();

    let mut ip = start;
    while ip <= mflimit {
        let mut m1 = chain.find_best(w, ip, match_limit, attempts, patterns);
        if m1.len < MIN_MATCH {
            ip += 1;
            continue;
        }

        let mut start0 = ip;
        let mut m0 = m1;
        let mut start2 = 0;
        let mut m2 = Match::NONE;
        let mut start3;
        let mut m3;
        let mut state = Lazy::Second;

        loop {
            if matches!(state, Lazy::Second) {
                if ip + m1.len <= mflimit {
                    start2 = ip + m1.len - 2;
                    m2 = chain.find_wider(w, start2, ip, match_limit, m1.len, attempts, patterns);
                    start2 -= m2.back;
                } else {
                    m2 = Match { len: m1.len, ..Match::NONE };
                }

                if m2.len <= m1.len {
                    ip = emit(out, buf, &mut anchor, ip, m1)?;
                    break;
                }

                if start0 < ip && start2 < ip + m0.len {
                    // The first match was skipped; squeeze it back in.
                    ip = start0;
                    m1 = m0;
                }

                if start2 - ip < 3 {
                    ip = start2;
                    m1 = m2;
                    continue;
                }
            }
            state = Lazy::Second;

            // Three-way selection: keep m1 short enough that m2 stays useful.
            if start2 - ip < OPTIMAL_ML {
                let mut new_len = m1.len.min(OPTIMAL_ML);
                if ip + new_len > start2 + m2.len - MIN_MATCH {
                    new_len = start2 - ip + m2.len - MIN_MATCH;
                }
                if new_len > start2 - ip {
                    let correction = new_len - (start2 - ip);
                    start2 += correction;
                    m2.len -= correction;
                }
            }

            if start2 + m2.len <= mflimit {
                start3 = start2 + m2.len - 3;
                m3 = chain.find_wider(w, start3, start2, match_limit, m2.len, attempts, patterns);
                start3 -= m3.back;
            } else {
                start3 = start2;
                m3 = Match { len: m2.len, ..Match::NONE };
            }

            if m3.len <= m2.len {
                if start2 < ip + m1.len {
                    m1.len = start2 - ip;
                }
                emit(out, buf, &mut anchor, ip, m1)?;
                ip = emit(out, buf, &mut anchor, start2, m2)?;
                break;
            }

            if start3 < ip + m1.len + 3 {
                if start3 >= ip + m1.len {
                    // m1 and m3 do not overlap: emit m1, m3 becomes the new
                    // first match with m2 as its fallback.
                    if start2 < ip + m1.len {
                        let correction = ip + m1.len - start2;
                        start2 += correction;
                        m2.len -= correction;
                        if m2.len < MIN_MATCH {
                            start2 = start3;
                            m2 = m3;
                        }
                    }
                    emit(out, buf, &mut anchor, ip, m1)?;
                    ip = start3;
                    m1 = m3;
                    start0 = start2;
                    m0 = m2;
                    continue;
                }

                start2 = start3;
                m2 = m3;
                state = Lazy::Third;
                continue;
            }

            // Three ascending matches: settle m1, shift the rest down.
            if start2 < ip + m1.len {
                if start2 - ip < OPTIMAL_ML {
                    m1.len = m1.len.min(OPTIMAL_ML);
                    if ip + m1.len > start2 + m2.len - MIN_MATCH {
                        m1.len = start2 - ip + m2.len - MIN_MATCH;
                    }
                    if m1.len > start2 - ip {
                        let correction = m1.len - (start2 - ip);
                        start2 += correction;
                        m2.len -= correction;
                    }
                } else {
                    m1.len = start2 - ip;
                }
            }
            emit(out, buf, &mut anchor, ip, m1)?;
            ip = start2;
            m1 = m2;
            start2 = start3;
            m2 = m3;
            state = Lazy::Third;
        }
    }

    out.last_literals(&buf[anchor..end])
}
