//! Codec configuration.

use oxibsc_core::error::{BscError, Result};

/// Largest supported block size (16 MiB).
///
/// Rotation offsets and the origin fit in a `u32`, and the end-of-stream
/// origin `u32::MAX` can never be a real origin.
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Default block size (1 MiB).
///
/// Sorting time grows roughly with the square of the block size when the
/// block has a very short period, such as `b"ab"` repeated: rotations that
/// are equal are compared across the whole block. A 64 KiB block of that
/// shape takes seconds and a 1 MiB block takes minutes. Use smaller blocks
/// for such input; the `bwt_periodic` bench tracks the cost.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Settings shared by the encoder and decoder of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum number of bytes per block.
    pub block_size: usize,
    /// Whether every block carries a CRC-32 of its bytes.
    pub checksum: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            checksum: true,
        }
    }
}

impl CodecConfig {
    /// Configuration with the given block size and checksums enabled.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            ..Self::default()
        }
    }

    /// Enable or disable per-block checksums.
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    /// Check that the block size is in `1..=MAX_BLOCK_SIZE`.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(BscError::invalid_block_size(self.block_size, MAX_BLOCK_SIZE));
        }
        Ok(())
    }
}
