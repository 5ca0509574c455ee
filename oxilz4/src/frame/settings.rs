//! Caller-facing frame configuration.

use super::descriptor::{BlockSize, FrameDescriptor};
use crate::level::CompressionLevel;
use oxilz4_core::error::{Lz4Error, Result};

/// Most extra history blocks a stream may keep.
pub const MAX_EXTRA_MEMORY: usize = 16;

/// An integrity feature the frame format can negotiate but the encoder does
/// not produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Feature {
    /// Not requested.
    #[default]
    Disabled,
    /// Requested; opening an encoder with it fails.
    Requested,
}

impl Feature {
    /// Whether the feature was asked for.
    pub fn is_requested(self) -> bool {
        self == Feature::Requested
    }
}

impl From<bool> for Feature {
    fn from(enabled: bool) -> Self {
        if enabled {
            Feature::Requested
        } else {
            Feature::Disabled
        }
    }
}

/// Frame encoder settings.
///
/// # Example
///
/// ```rust
/// use oxilz4::frame::{BlockSize, FrameSettings};
/// use oxilz4::CompressionLevel;
///
/// let settings = FrameSettings::new()
///     .with_level(CompressionLevel::DEFAULT_HC)
///     .with_block_size(BlockSize::Max256KB)
///     .with_chaining(false);
/// assert!(settings.descriptor().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSettings {
    /// Compression level.
    pub level: CompressionLevel,
    /// Maximum block size.
    pub block_size: BlockSize,
    /// Let blocks reference earlier blocks.
    pub chaining: bool,
    /// Extra blocks of history to keep, fewer slides for more memory.
    pub extra_memory: usize,
    /// Keep the transport alive when a writer or reader is closed.
    pub leave_open: bool,
    /// Declared content length, checked when the frame is closed.
    pub content_length: Option<u64>,
    /// Content checksum after the end marker.
    pub content_checksum: Feature,
    /// Checksum after every block.
    pub block_checksum: Feature,
    /// Preset dictionary identifier.
    pub dictionary_id: Option<u32>,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            level: CompressionLevel::FAST,
            block_size: BlockSize::default(),
            chaining: true,
            extra_memory: 0,
            leave_open: false,
            content_length: None,
            content_checksum: Feature::Disabled,
            block_checksum: Feature::Disabled,
            dictionary_id: None,
        }
    }
}

impl FrameSettings {
    /// Default settings: level 0, 64 KiB chained blocks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression level.
    pub fn with_level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: BlockSize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable block chaining.
    pub fn with_chaining(mut self, chaining: bool) -> Self {
        self.chaining = chaining;
        self
    }

    /// Set the extra memory hint.
    pub fn with_extra_memory(mut self, extra_memory: usize) -> Self {
        self.extra_memory = extra_memory;
        self
    }

    /// Keep the transport open after close.
    pub fn with_leave_open(mut self, leave_open: bool) -> Self {
        self.leave_open = leave_open;
        self
    }

    /// Declare the content length.
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Request a content checksum.
    pub fn with_content_checksum(mut self, feature: impl Into<Feature>) -> Self {
        self.content_checksum = feature.into();
        self
    }

    /// Request block checksums.
    pub fn with_block_checksum(mut self, feature: impl Into<Feature>) -> Self {
        self.block_checksum = feature.into();
        self
    }

    /// Request a preset dictionary.
    pub fn with_dictionary_id(mut self, id: u32) -> Self {
        self.dictionary_id = Some(id);
        self
    }

    /// Validate the settings and build the frame descriptor.
    pub fn descriptor(&self) -> Result<FrameDescriptor> {
        if self.content_checksum.is_requested() {
            return Err(Lz4Error::unsupported("content checksum generation"));
        }
        if self.block_checksum.is_requested() {
            return Err(Lz4Error::unsupported("block checksum generation"));
        }
        if self.dictionary_id.is_some() {
            return Err(Lz4Error::unsupported("preset dictionaries"));
        }
        if self.extra_memory > MAX_EXTRA_MEMORY {
            return Err(Lz4Error::invalid_argument(format!(
                "extra memory {} exceeds {MAX_EXTRA_MEMORY}",
                self.extra_memory
            )));
        }
        Ok(FrameDescriptor {
            content_length: self.content_length,
            content_checksum: false,
            block_chaining: self.chaining,
            block_checksum: false,
            dictionary_id: None,
            block_size: self.block_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptor() {
        let desc = FrameSettings::new().descriptor().expect("defaults are valid");
        assert!(desc.block_chaining);
        assert_eq!(desc.block_size, BlockSize::Max64KB);
        assert_eq!(desc.content_length, None);
    }

    #[test]
    fn test_unimplemented_features_rejected() {
        for settings in [
            FrameSettings::new().with_content_checksum(true),
            FrameSettings::new().with_block_checksum(Feature::Requested),
            FrameSettings::new().with_dictionary_id(7),
        ] {
            assert!(matches!(
                settings.descriptor(),
                Err(Lz4Error::UnsupportedFeature { .. })
            ));
        }
    }

    #[test]
    fn test_extra_memory_limit() {
        assert!(FrameSettings::new().with_extra_memory(16).descriptor().is_ok());
        assert!(matches!(
            FrameSettings::new().with_extra_memory(17).descriptor(),
            Err(Lz4Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_content_length_carried() {
        let desc = FrameSettings::new()
            .with_content_length(42)
            .with_chaining(false)
            .descriptor()
            .expect("valid");
        assert_eq!(desc.content_length, Some(42));
        assert!(!desc.block_chaining);
    }
}
