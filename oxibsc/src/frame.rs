//! Framed container.
//!
//! ```text
//! +-------+---------+-------+--------------+------------------------+
//! | magic | version | flags | block size   | range-coded blocks ... |
//! | OBSC  | u8 (1)  | u8    | u32 LE       | ... end-of-stream      |
//! +-------+---------+-------+--------------+------------------------+
//! ```
//!
//! Flag bit 0 means every block carries a CRC-32. All blocks share one range
//! coder stream, so the move-to-front list and the context models adapt
//! across block boundaries.

use crate::config::CodecConfig;
use crate::decode::{BlockDecoder, DecodeStatus};
use crate::encode::BlockEncoder;
use log::{debug, info};
use oxibsc_core::error::{BscError, Result};
use oxibsc_core::range_coder::{RangeDecoder, RangeEncoder};
use std::io::{self, Read, Write};

/// Frame magic bytes.
pub const FRAME_MAGIC: [u8; 4] = *b"OBSC";

/// Current frame format version.
pub const FRAME_VERSION: u8 = 1;

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 10;

const FLAG_CHECKSUM: u8 = 0x01;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Format version.
    pub version: u8,
    /// Whether blocks carry checksums.
    pub checksum: bool,
    /// Maximum block size of the stream.
    pub block_size: u32,
}

impl FrameHeader {
    /// Header for a stream written with `config`.
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            version: FRAME_VERSION,
            checksum: config.checksum,
            block_size: config.block_size as u32,
        }
    }

    /// Codec settings described by this header.
    pub fn config(&self) -> CodecConfig {
        CodecConfig::new(self.block_size as usize).with_checksum(self.checksum)
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&FRAME_MAGIC);
        bytes[4] = self.version;
        bytes[5] = if self.checksum { FLAG_CHECKSUM } else { 0 };
        bytes[6..].copy_from_slice(&self.block_size.to_le_bytes());
        bytes
    }

    /// Read and validate a header.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                BscError::unexpected_eof(HEADER_SIZE)
            } else {
                BscError::Io(e)
            }
        })?;

        if bytes[..4] != FRAME_MAGIC {
            return Err(BscError::invalid_magic(FRAME_MAGIC.to_vec(), bytes[..4].to_vec()));
        }
        let version = bytes[4];
        if version != FRAME_VERSION {
            return Err(BscError::invalid_header(format!(
                "Unsupported frame version: {version}"
            )));
        }
        let flags = bytes[5];
        if flags & !FLAG_CHECKSUM != 0 {
            return Err(BscError::invalid_header(format!(
                "Unknown frame flags: {flags:#04x}"
            )));
        }
        let block_size = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);

        let header = Self {
            version,
            checksum: flags & FLAG_CHECKSUM != 0,
            block_size,
        };
        header.config().validate()?;
        Ok(header)
    }
}

/// Streaming frame writer.
pub struct FrameEncoder<W: Write> {
    encoder: BlockEncoder<RangeEncoder<W>>,
    pending: Vec<u8>,
    block_size: usize,
    bytes_in: u64,
}

impl<W: Write> FrameEncoder<W> {
    /// Write the header and prepare to accept data.
    pub fn new(mut writer: W, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        writer.write_all(&FrameHeader::from_config(&config).to_bytes())?;
        let encoder = BlockEncoder::start(RangeEncoder::new(writer), config)?;
        info!(
            "compressing with {} byte blocks, checksums {}",
            config.block_size,
            if config.checksum { "on" } else { "off" }
        );
        Ok(Self {
            encoder,
            pending: Vec::new(),
            block_size: config.block_size,
            bytes_in: 0,
        })
    }

    /// Feed data. Every full block is encoded as soon as it is available.
    pub fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        self.bytes_in += data.len() as u64;

        if !self.pending.is_empty() {
            let take = (self.block_size - self.pending.len()).min(data.len());
            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.pending.len() == self.block_size {
                self.encoder.encode(&self.pending)?;
                self.pending.clear();
            }
        }

        while data.len() >= self.block_size {
            let used = self.encoder.encode(data)?;
            data = &data[used..];
        }
        self.pending.extend_from_slice(data);
        Ok(())
    }

    /// Bytes accepted so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Compressed bytes produced so far, excluding the header.
    pub fn bytes_out(&self) -> u64 {
        self.encoder.get_ref().bytes_written()
    }

    /// Encode the final partial block, end the stream and return the writer.
    pub fn finish(mut self) -> Result<W> {
        if !self.pending.is_empty() {
            self.encoder.encode(&self.pending)?;
        }
        let blocks = self.encoder.blocks_written();
        let coder = self.encoder.finish()?;
        debug!(
            "frame finished: {} bytes in, {} bytes out, {} blocks",
            self.bytes_in,
            coder.bytes_written() + HEADER_SIZE as u64,
            blocks
        );
        Ok(coder.into_inner())
    }
}

/// Streaming frame reader.
pub struct FrameDecoder<R: Read> {
    header: FrameHeader,
    decoder: BlockDecoder<RangeDecoder<R>>,
    buffer: Vec<u8>,
}

impl<R: Read> FrameDecoder<R> {
    /// Parse the header and prepare to decode blocks.
    ///
    /// The range decoder reads one byte at a time, so wrap unbuffered
    /// sources in a `BufReader`.
    pub fn new(mut reader: R) -> Result<Self> {
        let header = FrameHeader::read_from(&mut reader)?;
        let config = header.config();
        let decoder = BlockDecoder::start(RangeDecoder::new(reader)?, config)?;
        Ok(Self {
            header,
            decoder,
            buffer: vec![0; config.block_size],
        })
    }

    /// Header of the frame being decoded.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Blocks decoded so far.
    pub fn blocks_read(&self) -> u64 {
        self.decoder.blocks_read()
    }

    /// Decode the next block, or `None` at the end of the stream.
    pub fn read_block(&mut self) -> Result<Option<&[u8]>> {
        match self.decoder.decode(&mut self.buffer)? {
            DecodeStatus::Block(len) => Ok(Some(&self.buffer[..len])),
            DecodeStatus::EndOfStream => Ok(None),
            DecodeStatus::NeedsOutput { needed } => Err(BscError::invalid_header(format!(
                "block buffer of {} bytes, {needed} needed",
                self.buffer.len()
            ))),
        }
    }

    /// Decode all remaining blocks onto `out`. Returns the bytes appended.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        while let Some(block) = self.read_block()? {
            out.extend_from_slice(block);
        }
        Ok(out.len() - start)
    }
}

/// Compress `data` into a complete frame.
pub fn compress(data: &[u8], config: &CodecConfig) -> Result<Vec<u8>> {
    let mut encoder = FrameEncoder::new(Vec::with_capacity(data.len() / 2 + 64), *config)?;
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a complete frame.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = FrameDecoder::new(data)?;
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
