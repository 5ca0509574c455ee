//! Block decoder.
//!
//! One routine handles every variant: it is parameterized by how decoding
//! ends (input exhausted, or a target output size reached exactly or
//! partially) and by where back-references may reach (nothing before the
//! output, a prefix already in the output buffer, or a separate dictionary).
//! Every structural violation is [`Lz4Error::CorruptData`]; in input-driven
//! mode a destination that cannot hold the output is
//! [`Lz4Error::OutputTooSmall`].

use super::{MIN_MATCH, ML_MASK, RUN_MASK};
use oxilz4_core::buffer::{peek_u16, wild_copy};
use oxilz4_core::error::{Lz4Error, Result};

/// What ends a decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndCondition {
    /// Decode until the compressed input is consumed.
    InputSize,
    /// Decode until the output target is reached. Exact mode requires the
    /// block to end there; partial mode stops early and ignores the rest.
    OutputSize { partial: bool },
}

/// Where matches may read from besides the bytes decoded by this call.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DictMode<'d> {
    None,
    /// `out[..out_start]` holds history.
    Prefix,
    /// History lives in a separate buffer that logically precedes `out`.
    External(&'d [u8]),
}

#[inline]
fn read_length(src: &[u8], ip: &mut usize) -> Result<usize> {
    let mut len = 0usize;
    loop {
        let Some(&byte) = src.get(*ip) else {
            return Err(Lz4Error::corrupted(*ip as u64, "truncated length extension"));
        };
        *ip += 1;
        len += usize::from(byte);
        if byte != 255 {
            return Ok(len);
        }
    }
}

/// Decode `src` into `out[out_start..out_end]`, returning the bytes written.
pub(crate) fn decode(
    src: &[u8],
    out: &mut [u8],
    out_start: usize,
    out_end: usize,
    end: EndCondition,
    dict: DictMode<'_>,
) -> Result<usize> {
    debug_assert!(out_start <= out_end && out_end <= out.len());

    let partial = matches!(end, EndCondition::OutputSize { partial: true });
    let exact = matches!(end, EndCondition::OutputSize { partial: false });
    if partial && out_start == out_end {
        return Ok(0);
    }

    let (window_start, external) = match dict {
        DictMode::None => (out_start, &[][..]),
        DictMode::Prefix => (0, &[][..]),
        DictMode::External(d) => (out_start, d),
    };

    let mut ip = 0;
    let mut op = out_start;

    loop {
        if ip >= src.len() {
            return Err(Lz4Error::corrupted(ip as u64, "block ends without final literals"));
        }
        let token_pos = ip;
        let token = src[ip];
        ip += 1;

        let mut lit_len = usize::from(token >> 4);
        if lit_len == RUN_MASK {
            lit_len += read_length(src, &mut ip)?;
        }
        if lit_len > src.len() - ip {
            return Err(Lz4Error::corrupted(
                token_pos as u64,
                format!("literal run of {lit_len} bytes exceeds the block"),
            ));
        }
        if lit_len > out_end - op {
            if partial {
                let n = out_end - op;
                out[op..out_end].copy_from_slice(&src[ip..ip + n]);
                return Ok(out_end - out_start);
            }
            if exact {
                return Err(Lz4Error::corrupted(
                    token_pos as u64,
                    "literal run exceeds declared size",
                ));
            }
            return Err(Lz4Error::output_too_small(
                op + lit_len - out_start,
                out_end - out_start,
            ));
        }
        out[op..op + lit_len].copy_from_slice(&src[ip..ip + lit_len]);
        op += lit_len;
        ip += lit_len;

        if ip == src.len() {
            if exact && op != out_end {
                return Err(Lz4Error::corrupted(
                    ip as u64,
                    format!(
                        "block decoded to {} bytes, declared {}",
                        op - out_start,
                        out_end - out_start
                    ),
                ));
            }
            return Ok(op - out_start);
        }
        if op == out_end {
            if partial {
                return Ok(op - out_start);
            }
            if exact {
                return Err(Lz4Error::corrupted(ip as u64, "data past declared size"));
            }
        }

        if src.len() - ip < 2 {
            return Err(Lz4Error::corrupted(ip as u64, "truncated match offset"));
        }
        let offset = usize::from(peek_u16(src, ip));
        let offset_pos = ip;
        ip += 2;

        let mut match_len = usize::from(token & ML_MASK as u8);
        if match_len == ML_MASK {
            match_len += read_length(src, &mut ip)?;
        }
        match_len += MIN_MATCH;

        if offset == 0 {
            return Err(Lz4Error::corrupted(offset_pos as u64, "zero match offset"));
        }
        let in_window = op - window_start;
        if offset > in_window + external.len() {
            return Err(Lz4Error::corrupted(
                offset_pos as u64,
                format!("match offset {offset} reaches before the window"),
            ));
        }
        if match_len > out_end - op {
            if partial {
                match_len = out_end - op;
            } else if exact {
                return Err(Lz4Error::corrupted(
                    offset_pos as u64,
                    "match exceeds declared size",
                ));
            } else {
                return Err(Lz4Error::output_too_small(
                    op + match_len - out_start,
                    out_end - out_start,
                ));
            }
        }

        if offset <= in_window {
            wild_copy(out, op, offset, match_len);
        } else {
            let from_dict = offset - in_window;
            let dict_pos = external.len() - from_dict;
            let n = from_dict.min(match_len);
            out[op..op + n].copy_from_slice(&external[dict_pos..dict_pos + n]);
            if match_len > n {
                wild_copy(out, op + n, offset, match_len - n);
            }
        }
        op += match_len;

        if partial && op == out_end {
            return Ok(op - out_start);
        }
    }
}

/// Decode a block into `dst`, returning the decoded length.
///
/// Fails with [`Lz4Error::OutputTooSmall`] when `dst` cannot hold the
/// result and [`Lz4Error::CorruptData`] when the block is malformed.
pub fn decompress_safe(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let end = dst.len();
    decode(src, dst, 0, end, EndCondition::InputSize, DictMode::None)
}

/// Decode a block whose decoded size is exactly `dst.len()`.
///
/// The block must produce exactly that many bytes and end there.
pub fn decompress_sized(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let end = dst.len();
    decode(
        src,
        dst,
        0,
        end,
        EndCondition::OutputSize { partial: false },
        DictMode::None,
    )
}

/// Decode at most `target` bytes of a block into `dst`.
///
/// Decoding stops as soon as `target` (or `dst.len()`, if smaller) bytes are
/// produced; the rest of the block is not examined.
pub fn decompress_partial(src: &[u8], dst: &mut [u8], target: usize) -> Result<usize> {
    let end = target.min(dst.len());
    decode(
        src,
        dst,
        0,
        end,
        EndCondition::OutputSize { partial: true },
        DictMode::None,
    )
}

/// Decode a block into `buf[prefix_len..]`, letting matches reach back into
/// `buf[..prefix_len]`.
pub fn decompress_with_prefix(src: &[u8], buf: &mut [u8], prefix_len: usize) -> Result<usize> {
    if prefix_len > buf.len() {
        return Err(Lz4Error::invalid_argument(format!(
            "prefix of {prefix_len} bytes does not fit a {} byte buffer",
            buf.len()
        )));
    }
    let end = buf.len();
    decode(src, buf, prefix_len, end, EndCondition::InputSize, DictMode::Prefix)
}

/// Decode a block into `dst`, letting matches reach into `dict`, which
/// logically precedes the output.
pub fn decompress_using_dict(src: &[u8], dst: &mut [u8], dict: &[u8]) -> Result<usize> {
    let end = dst.len();
    decode(src, dst, 0, end, EndCondition::InputSize, DictMode::External(dict))
}

/// Decode a block into a new vector of at most `max_output` bytes.
pub fn decompress_block(src: &[u8], max_output: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; max_output];
    let n = decompress_safe(src, &mut output)?;
    output.truncate(n);
    Ok(output)
}
