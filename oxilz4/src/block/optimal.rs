//! Levels 10-12: price-based optimal parsing over a bounded window.
//!
//! Starting at a match, every reachable position up to [`OPT_NUM`] bytes
//! ahead is given the cheapest known encoded cost, either as one more
//! literal or as the end of a match. Walking back from the last match
//! recovers the cheapest path, which is then emitted.

use super::matcher::{HashChain, Match, Window};
use super::sequence::{SequenceWriter, literals_price, sequence_price};
use super::{LAST_LITERALS, MF_LIMIT, MIN_INPUT_LENGTH, MIN_MATCH};
use crate::level::OptimalParams;
use oxilz4_core::error::Result;

/// Positions priced per parsing window.
pub(crate) const OPT_NUM: usize = 1 << 12;

/// Literal positions priced past the last match.
const TRAILING_LITERALS: usize = 3;

/// Cheapest known way to reach a position.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OptNode {
    price: usize,
    offset: usize,
    /// 1 for a literal, otherwise the length of the match ending here.
    mlen: usize,
    /// Literals pending before this position.
    litlen: usize,
}

impl OptNode {
    #[inline]
    fn literal(litlen: usize, price: usize) -> Self {
        Self {
            price,
            offset: 0,
            mlen: 1,
            litlen,
        }
    }
}

/// Scratch table for one encoder.
pub(crate) fn new_nodes() -> Vec<OptNode> {
    vec![OptNode::default(); OPT_NUM + TRAILING_LITERALS]
}

#[inline]
fn fill_trailing(opt: &mut [OptNode], last_match_pos: usize) {
    for add in 1..=TRAILING_LITERALS {
        opt[last_match_pos + add] =
            OptNode::literal(add, opt[last_match_pos].price + literals_price(add));
    }
}

pub(super) fn compress(
    chain: &mut HashChain,
    opt: &mut [OptNode],
    params: OptimalParams,
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
    let sufficient_len = params.sufficient_len.min(OPT_NUM - 1);
    let attempts = params.nb_searches;

    let mut ip = start;
    while ip <= mflimit {
        let llen = ip - anchor;
        let first = chain.find_longer(w, ip, match_limit, MIN_MATCH - 1, attempts, true);
        if first.len == 0 {
            ip += 1;
            continue;
        }

        if first.len > sufficient_len {
            out.sequence(&buf[anchor..ip], first.offset, first.len)?;
            ip += first.len;
            anchor = ip;
            continue;
        }

        for r in 0..MIN_MATCH {
            opt[r] = OptNode::literal(llen + r, literals_price(llen + r));
        }
        for len in MIN_MATCH..=first.len {
            opt[len] = OptNode {
                price: sequence_price(llen, len),
                offset: first.offset,
                mlen: len,
                litlen: llen,
            };
        }
        let mut last_match_pos = first.len;
        fill_trailing(opt, last_match_pos);

        let mut early: Option<(usize, Match)> = None;
        let mut cur = 1;
        while cur < last_match_pos {
            let cur_pos = ip + cur;
            if cur_pos > mflimit {
                break;
            }

            let skip = if params.full_update {
                opt[cur + 1].price <= opt[cur].price
                    && opt[cur + MIN_MATCH].price < opt[cur].price + 3
            } else {
                opt[cur + 1].price <= opt[cur].price
            };
            if skip {
                cur += 1;
                continue;
            }

            let min_len = if params.full_update {
                MIN_MATCH - 1
            } else {
                last_match_pos - cur
            };
            let m = chain.find_longer(w, cur_pos, match_limit, min_len, attempts, true);
            if m.len == 0 {
                cur += 1;
                continue;
            }

            if m.len > sufficient_len || m.len + cur >= OPT_NUM {
                early = Some((cur, m));
                last_match_pos = cur + 1;
                break;
            }

            let base_litlen = opt[cur].litlen;
            for add in 1..MIN_MATCH {
                let price = opt[cur].price + literals_price(base_litlen + add)
                    - literals_price(base_litlen);
                let pos = cur + add;
                if price < opt[pos].price {
                    opt[pos] = OptNode::literal(base_litlen + add, price);
                }
            }

            for len in MIN_MATCH..=m.len {
                let pos = cur + len;
                let (litlen, price) = if opt[cur].mlen == 1 {
                    let ll = opt[cur].litlen;
                    let before = if cur > ll { opt[cur - ll].price } else { 0 };
                    (ll, before + sequence_price(ll, len))
                } else {
                    (0, opt[cur].price + sequence_price(0, len))
                };
                if pos > last_match_pos + TRAILING_LITERALS || price <= opt[pos].price {
                    if len == m.len && last_match_pos < pos {
                        last_match_pos = pos;
                    }
                    opt[pos] = OptNode {
                        price,
                        offset: m.offset,
                        mlen: len,
                        litlen,
                    };
                }
            }
            fill_trailing(opt, last_match_pos);
            cur += 1;
        }

        let (mut selected, mut candidate) = match early {
            Some((cur, m)) => ((m.len, m.offset), cur),
            None => {
                let node = opt[last_match_pos];
                ((node.mlen, node.offset), last_match_pos - node.mlen)
            }
        };

        // Reverse the back-links so the path can be walked forwards.
        loop {
            let next = (opt[candidate].mlen, opt[candidate].offset);
            opt[candidate].mlen = selected.0;
            opt[candidate].offset = selected.1;
            selected = next;
            if next.0 == 0 || next.0 > candidate {
                break;
            }
            candidate -= next.0;
        }

        let mut r = 0;
        while r < last_match_pos {
            let node = opt[r];
            if node.mlen == 1 {
                ip += 1;
                r += 1;
                continue;
            }
            r += node.mlen;
            out.sequence(&buf[anchor..ip], node.offset, node.mlen)?;
            ip += node.mlen;
            anchor = ip;
        }
    }

    out.last_literals(&buf[anchor..end])
}

#[cfg(test)]
mod tests {
    use super::super::matcher::START_INDEX;
    use super::*;
    use crate::level::{CompressionLevel, Strategy};

    fn encode(data: &[u8], level: u8) -> Vec<u8> {
        let params = match CompressionLevel::new(level).map(|l| l.strategy()) {
            Ok(Strategy::Optimal(p)) => p,
            other => panic!("unexpected {other:?}"),
        };
        let w = Window {
            buf: data,
            base: START_INDEX,
            low: 0,
        };
        let mut chain = HashChain::new();
        let mut opt = new_nodes();
        let mut dst = vec![0u8; super::super::compress_bound(data.len())];
        let mut out = SequenceWriter::new(&mut dst);
        compress(&mut chain, &mut opt, params, &w, 0, data.len(), &mut out).expect("fits");
        let n = out.len();
        dst.truncate(n);
        dst
    }

    fn sample() -> Vec<u8> {
        let words = ["alpha ", "beta ", "gamma ", "delta ", "epsilon ", "zeta "];
        let mut seed = 7u32;
        let mut data = Vec::new();
        while data.len() < 50_000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            data.extend_from_slice(words[(seed >> 16) as usize % words.len()].as_bytes());
        }
        data
    }

    #[test]
    fn test_roundtrip_levels() {
        let data = sample();
        for level in 10..=12 {
            let encoded = encode(&data, level);
            let decoded =
                super::super::decode::decompress_block(&encoded, data.len()).expect("valid");
            assert_eq!(decoded, data, "level {level}");
        }
    }

    #[test]
    fn test_long_run_uses_sufficient_length() {
        let data = vec![b'q'; 100_000];
        let encoded = encode(&data, 10);
        assert!(encoded.len() < 500);
        let decoded = super::super::decode::decompress_block(&encoded, data.len()).expect("valid");
        assert_eq!(decoded, data);
    }
}
