//! Compression levels and the strategy each level selects.
//!
//! Level 0 is the fast greedy encoder. Levels 3-9 use the hash-chain lazy
//! encoder with a doubling search budget. Levels 10-12 use the optimal
//! parser. Levels 1 and 2 are not defined.

use oxilz4_core::error::{Lz4Error, Result};
use std::fmt;
use std::str::FromStr;

/// Parameters of the fast (level 0) encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastParams {
    /// Skip acceleration. 1 is the reference behavior; larger values give up
    /// ratio for speed on incompressible input.
    pub acceleration: u32,
}

/// Parameters of the hash-chain lazy encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HcParams {
    /// Maximum chain candidates examined per search.
    pub nb_searches: u32,
}

impl HcParams {
    /// Repetitive-pattern skipping pays off only with deep searches.
    pub fn pattern_analysis(&self) -> bool {
        self.nb_searches > 128
    }
}

/// Parameters of the optimal parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimalParams {
    /// Maximum chain candidates examined per search.
    pub nb_searches: u32,
    /// A match at least this long is taken without further parsing.
    pub sufficient_len: usize,
    /// Re-examine every position inside the current window instead of
    /// skipping positions already covered by a good match.
    pub full_update: bool,
}

/// Encoding strategy, selected from the compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Single-probe hash table, greedy parsing.
    Fast(FastParams),
    /// Hash chains with lazy (3-way) match selection.
    Hc(HcParams),
    /// Hash chains with price-based optimal parsing.
    Optimal(OptimalParams),
}

impl Strategy {
    /// Short name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fast(_) => "fast",
            Strategy::Hc(_) => "hc",
            Strategy::Optimal(_) => "optimal",
        }
    }
}

/// Compression level: 0 or 3-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest level, greedy parsing.
    pub const FAST: Self = Self(0);
    /// Lowest hash-chain level.
    pub const MIN_HC: Self = Self(3);
    /// Default hash-chain level.
    pub const DEFAULT_HC: Self = Self(9);
    /// Lowest optimal-parsing level.
    pub const MIN_OPTIMAL: Self = Self(10);
    /// Maximum compression.
    pub const MAX: Self = Self(12);

    /// Create a compression level.
    ///
    /// Levels 1, 2 and anything above 12 are rejected with
    /// [`Lz4Error::InvalidArgument`].
    pub fn new(level: u8) -> Result<Self> {
        match level {
            0 | 3..=12 => Ok(Self(level)),
            _ => Err(Lz4Error::invalid_argument(format!(
                "compression level {level} is not supported (use 0 or 3-12)"
            ))),
        }
    }

    /// Numeric level.
    pub fn level(self) -> u8 {
        self.0
    }

    /// Whether this level uses the hash-chain or optimal encoders.
    pub fn is_high_compression(self) -> bool {
        self.0 >= Self::MIN_HC.0
    }

    /// Strategy and parameters for this level.
    pub fn strategy(self) -> Strategy {
        match self.0 {
            0..=2 => Strategy::Fast(FastParams { acceleration: 1 }),
            level @ 3..=9 => Strategy::Hc(HcParams {
                nb_searches: 1 << (level - 1),
            }),
            10 => Strategy::Optimal(OptimalParams {
                nb_searches: 96,
                sufficient_len: 64,
                full_update: false,
            }),
            11 => Strategy::Optimal(OptimalParams {
                nb_searches: 512,
                sufficient_len: 128,
                full_update: false,
            }),
            _ => Strategy::Optimal(OptimalParams {
                nb_searches: 16384,
                sufficient_len: 4096,
                full_update: true,
            }),
        }
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = Lz4Error;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl FromStr for CompressionLevel {
    type Err = Lz4Error;

    fn from_str(s: &str) -> Result<Self> {
        let level: u8 = s
            .trim()
            .parse()
            .map_err(|_| Lz4Error::invalid_argument(format!("not a compression level: {s:?}")))?;
        Self::new(level)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
