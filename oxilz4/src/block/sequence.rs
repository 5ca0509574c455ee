//! Bounded token writer for the block format.
//!
//! A sequence is `token, [literal length bytes], literals, offset (u16 LE),
//! [match length bytes]`. The high nibble of the token holds the literal
//! length, the low nibble the match length minus [`MIN_MATCH`]; a nibble of
//! 15 means 255-valued extension bytes follow. Every write is checked
//! against the destination, so an encoder can target a buffer smaller than
//! the input and learn early that the block does not fit.

use super::{MIN_MATCH, ML_MASK, RUN_MASK};
use oxilz4_core::buffer::{block_copy, poke_u16};
use oxilz4_core::error::{Lz4Error, Result};

/// Number of extension bytes needed to encode `len` in a nibble.
#[inline]
fn extra_bytes(len: usize, mask: usize) -> usize {
    if len >= mask {
        (len - mask) / 255 + 1
    } else {
        0
    }
}

/// Encoded cost of a literal run of length `lit_len`, in bytes.
#[inline]
pub(crate) fn literals_price(lit_len: usize) -> usize {
    lit_len + extra_bytes(lit_len, RUN_MASK)
}

/// Encoded cost of a sequence with `lit_len` literals and a match of
/// `match_len` bytes.
#[inline]
pub(crate) fn sequence_price(lit_len: usize, match_len: usize) -> usize {
    // token + offset
    3 + literals_price(lit_len) + extra_bytes(match_len - MIN_MATCH, ML_MASK)
}

/// Writes sequences into a fixed destination slice.
pub(crate) struct SequenceWriter<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl<'a> SequenceWriter<'a> {
    pub(crate) fn new(dst: &'a mut [u8]) -> Self {
        Self { dst, pos: 0 }
    }

    /// Bytes written so far.
    pub(crate) fn len(&self) -> usize {
        self.pos
    }

    #[inline]
    fn reserve(&self, needed: usize) -> Result<()> {
        let end = self.pos + needed;
        if end > self.dst.len() {
            return Err(Lz4Error::output_too_small(end, self.dst.len()));
        }
        Ok(())
    }

    #[inline]
    fn put_length(&mut self, mut len: usize) {
        while len >= 255 {
            self.dst[self.pos] = 255;
            self.pos += 1;
            len -= 255;
        }
        self.dst[self.pos] = len as u8;
        self.pos += 1;
    }

    /// Emit `literals` followed by a match of `match_len` bytes at `offset`.
    pub(crate) fn sequence(
        &mut self,
        literals: &[u8],
        offset: usize,
        match_len: usize,
    ) -> Result<()> {
        debug_assert!(match_len >= MIN_MATCH);
        debug_assert!((1..=super::MAX_DISTANCE).contains(&offset));

        let lit_len = literals.len();
        let ml_code = match_len - MIN_MATCH;
        self.reserve(1 + literals_price(lit_len) + 2 + extra_bytes(ml_code, ML_MASK))?;

        let token_pos = self.pos;
        self.pos += 1;
        let lit_nibble = if lit_len >= RUN_MASK {
            self.put_length(lit_len - RUN_MASK);
            RUN_MASK
        } else {
            lit_len
        };
        block_copy(self.dst, self.pos, literals);
        self.pos += lit_len;

        poke_u16(self.dst, self.pos, offset as u16);
        self.pos += 2;

        let ml_nibble = if ml_code >= ML_MASK {
            self.put_length(ml_code - ML_MASK);
            ML_MASK
        } else {
            ml_code
        };
        self.dst[token_pos] = ((lit_nibble << 4) | ml_nibble) as u8;
        Ok(())
    }

    /// Emit the trailing literal-only sequence that ends every block.
    pub(crate) fn last_literals(&mut self, literals: &[u8]) -> Result<()> {
        let lit_len = literals.len();
        self.reserve(1 + literals_price(lit_len))?;

        let token_pos = self.pos;
        self.pos += 1;
        let lit_nibble = if lit_len >= RUN_MASK {
            self.put_length(lit_len - RUN_MASK);
            RUN_MASK
        } else {
            lit_len
        };
        self.dst[token_pos] = (lit_nibble << 4) as u8;
        block_copy(self.dst, self.pos, literals);
        self.pos += lit_len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequence_layout() {
        let mut dst = [0u8; 16];
        let mut w = SequenceWriter::new(&mut dst);
        w.sequence(b"ab", 2, 6).expect("fits");
        w.last_literals(b"z").expect("fits");
        let n = w.len();
        assert_eq!(&dst[..n], &[0x22, b'a', b'b', 0x02, 0x00, 0x10, b'z']);
    }

    #[test]
    fn test_long_lengths_use_extension_bytes() {
        let literals = vec![7u8; 15 + 255 + 3];
        let mut dst = vec![0u8; 400];
        let mut w = SequenceWriter::new(&mut dst);
        w.sequence(&literals, 1, MIN_MATCH + 15 + 255).expect("fits");
        let n = w.len();
        assert_eq!(dst[0], 0xFF);
        assert_eq!(&dst[1..3], &[255, 3]);
        let after_literals = 3 + literals.len();
        assert_eq!(&dst[after_literals..after_literals + 2], &[1, 0]);
        assert_eq!(&dst[after_literals + 2..n], &[255, 0]);
    }

    #[test]
    fn test_overflow_reports_output_too_small() {
        let mut dst = [0u8; 4];
        let mut w = SequenceWriter::new(&mut dst);
        match w.last_literals(b"hello") {
            Err(Lz4Error::OutputTooSmall { needed, available }) => {
                assert_eq!(needed, 6);
                assert_eq!(available, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_prices() {
        assert_eq!(literals_price(0), 0);
        assert_eq!(literals_price(14), 14);
        assert_eq!(literals_price(15), 16);
        assert_eq!(literals_price(15 + 255), 15 + 255 + 2);
        assert_eq!(sequence_price(0, 4), 3);
        assert_eq!(sequence_price(0, 18), 3);
        assert_eq!(sequence_price(0, 19), 4);
        assert_eq!(sequence_price(1, 19), 5);
    }
}
