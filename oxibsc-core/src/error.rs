//! Error types for OxiBSC operations.
//!
//! Only malformed or truncated input produces an error. The two structural
//! outcomes of block decoding (output buffer too small, end of stream) are
//! reported as status values by the codec, not through this type.

use std::io;
use thiserror::Error;

/// The main error type for OxiBSC operations.
#[derive(Debug, Error)]
pub enum BscError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in frame header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Block size outside the supported range.
    #[error("Invalid block size {size}: must be between 1 and {max}")]
    InvalidBlockSize {
        /// Requested block size.
        size: usize,
        /// Largest supported block size.
        max: usize,
    },

    /// Block checksum mismatch.
    #[error("CRC mismatch in block {block}: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Index of the failing block within the stream.
        block: u64,
        /// Checksum stored in the stream.
        expected: u32,
        /// Checksum of the decoded bytes.
        computed: u32,
    },

    /// Corrupted symbol stream.
    #[error("Corrupted data in block {block}: {message}")]
    CorruptedData {
        /// Index of the block being decoded.
        block: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Decoded symbol outside the alphabet of its context.
    #[error("Invalid symbol {symbol} for alphabet of {alphabet}")]
    InvalidSymbol {
        /// The decoded symbol.
        symbol: u32,
        /// Alphabet size of the context.
        alphabet: u32,
    },

    /// Origin does not point inside the decoded block.
    #[error("Invalid origin {origin} for block of {len} bytes")]
    InvalidOrigin {
        /// Decoded origin row.
        origin: u32,
        /// Length of the decoded block.
        len: usize,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },
}

/// Result type alias for OxiBSC operations.
pub type Result<T> = std::result::Result<T, BscError>;

impl BscError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an invalid block size error.
    pub fn invalid_block_size(size: usize, max: usize) -> Self {
        Self::InvalidBlockSize { size, max }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(block: u64, expected: u32, computed: u32) -> Self {
        Self::CrcMismatch {
            block,
            expected,
            computed,
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(block: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            block,
            message: message.into(),
        }
    }

    /// Create an invalid symbol error.
    pub fn invalid_symbol(symbol: u32, alphabet: u32) -> Self {
        Self::InvalidSymbol { symbol, alphabet }
    }

    /// Create an invalid origin error.
    pub fn invalid_origin(origin: u32, len: usize) -> Self {
        Self::InvalidOrigin { origin, len }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }
}
