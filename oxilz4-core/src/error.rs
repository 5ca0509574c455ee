//! Error types for OxiLZ4 operations.
//!
//! Every failure the codec can report falls into one of five categories:
//! caller bugs ([`Lz4Error::InvalidArgument`]), undersized destination buffers
//! ([`Lz4Error::OutputTooSmall`]), malformed input ([`Lz4Error::CorruptData`]),
//! truncated transports ([`Lz4Error::UnexpectedEndOfStream`]) and integrity or
//! format features this implementation refuses to fake
//! ([`Lz4Error::UnsupportedFeature`]). Transport failures are carried through
//! as [`Lz4Error::Io`].
//!
//! None of these are retried internally. A stream instance that returned an
//! error must be discarded.

use std::io;
use thiserror::Error;

/// The main error type for OxiLZ4 operations.
#[derive(Debug, Error)]
pub enum Lz4Error {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad offsets, lengths or settings passed by the caller.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// Destination buffer is too small for a bounded operation.
    #[error("Output buffer too small: need {needed} bytes, have {available}")]
    OutputTooSmall {
        /// Number of bytes needed (a lower bound when not exactly known).
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Malformed header, bad magic, checksum mismatch or an invalid token.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptData {
        /// Byte offset (within the input being decoded) where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// The transport ran dry before a structurally required field was read.
    #[error("Unexpected end of stream: expected {expected} more bytes")]
    UnexpectedEndOfStream {
        /// Number of bytes that were still required.
        expected: usize,
    },

    /// A requested feature is not implemented.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// Name of the feature.
        feature: String,
    },
}

/// Result type alias for OxiLZ4 operations.
pub type Result<T> = std::result::Result<T, Lz4Error>;

impl Lz4Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an output too small error.
    pub fn output_too_small(needed: usize, available: usize) -> Self {
        Self::OutputTooSmall { needed, available }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptData {
            offset,
            message: message.into(),
        }
    }

    /// Create a checksum mismatch error (reported as corrupted data).
    pub fn checksum_mismatch(what: &str, offset: u64, expected: u32, computed: u32) -> Self {
        Self::CorruptData {
            offset,
            message: format!(
                "{what} mismatch: expected {expected:#010x}, computed {computed:#010x}"
            ),
        }
    }

    /// Create an unexpected end of stream error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEndOfStream { expected }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    /// Check whether this error means the input was malformed.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    /// Check whether this error means the input ended too early.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::UnexpectedEndOfStream { .. })
    }

    /// Shift the offset of a [`Lz4Error::CorruptData`] by `base`, turning a
    /// position inside a sub-buffer into a position in the enclosing stream.
    pub fn rebased(self, base: u64) -> Self {
        match self {
            Self::CorruptData { offset, message } => Self::CorruptData {
                offset: offset + base,
                message,
            },
            other => other,
        }
    }

    /// Recover an `Lz4Error` that was tunnelled through an `io::Error`.
    ///
    /// Plain I/O errors come back as [`Lz4Error::Io`].
    pub fn from_io(err: io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<Lz4Error>()) {
            match err.into_inner().map(|inner| inner.downcast::<Lz4Error>()) {
                Some(Ok(inner)) => *inner,
                // Unreachable given the `is` check above, but keep the error.
                Some(Err(other)) => Self::Io(io::Error::other(other)),
                None => Self::Io(io::Error::other("empty I/O error")),
            }
        } else {
            Self::Io(err)
        }
    }
}

impl From<Lz4Error> for io::Error {
    fn from(err: Lz4Error) -> Self {
        let kind = match err {
            Lz4Error::Io(inner) => return inner,
            Lz4Error::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
            Lz4Error::OutputTooSmall { .. } => io::ErrorKind::WriteZero,
            Lz4Error::CorruptData { .. } => io::ErrorKind::InvalidData,
            Lz4Error::UnexpectedEndOfStream { .. } => io::ErrorKind::UnexpectedEof,
            Lz4Error::UnsupportedFeature { .. } => io::ErrorKind::Unsupported,
        };
        io::Error::new(kind, err)
    }
}
