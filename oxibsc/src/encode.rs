//! Block encoder.

use crate::block_sort::BlockSorter;
use crate::bwt;
use crate::config::CodecConfig;
use crate::mtf::MtfRecoder;
use log::debug;
use oxibsc_core::error::Result;
use oxibsc_core::traits::EntropyEncoder;

/// Origin value that marks the end of the stream.
pub const END_OF_STREAM: u32 = u32::MAX;

/// Encodes blocks through an entropy coder.
///
/// Each block is written as its origin word, the recoded BWT output up to
/// `EOB`, and the CRC-32 of the input when checksums are enabled.
/// [`BlockEncoder::finish`] writes the end-of-stream origin.
pub struct BlockEncoder<E: EntropyEncoder> {
    coder: E,
    config: CodecConfig,
    sorter: BlockSorter,
    last: Vec<u8>,
    recoder: MtfRecoder<E::Context>,
    blocks: u64,
}

impl<E: EntropyEncoder> BlockEncoder<E> {
    /// Set up all scratch state for `config` around `coder`.
    pub fn start(mut coder: E, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let recoder = MtfRecoder::new(|spec| coder.make_context(spec));
        Ok(Self {
            coder,
            config,
            sorter: BlockSorter::new(config.block_size),
            last: Vec::with_capacity(config.block_size),
            recoder,
            blocks: 0,
        })
    }

    /// Encode one block taken from the front of `input`.
    ///
    /// Consumes at most `block_size` bytes and returns how many were used.
    /// Empty input writes nothing.
    pub fn encode(&mut self, input: &[u8]) -> Result<usize> {
        let len = input.len().min(self.config.block_size);
        if len == 0 {
            return Ok(0);
        }
        let block = &input[..len];

        let origin = bwt::transform(&mut self.sorter, block, &mut self.last);
        self.recoder.encode_word(&mut self.coder, origin)?;
        self.recoder.encode_block(&mut self.coder, &self.last)?;
        if self.config.checksum {
            let crc = crc32fast::hash(block);
            self.recoder.encode_word(&mut self.coder, crc)?;
        }

        debug!("encoded block {} ({} bytes, origin {})", self.blocks, len, origin);
        self.blocks += 1;
        Ok(len)
    }

    /// Number of blocks encoded so far.
    pub fn blocks_written(&self) -> u64 {
        self.blocks
    }

    /// Configuration the encoder was started with.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Get a reference to the entropy coder.
    pub fn get_ref(&self) -> &E {
        &self.coder
    }

    /// Write the end-of-stream marker, flush the coder and return it.
    pub fn finish(mut self) -> Result<E> {
        self.recoder.encode_word(&mut self.coder, END_OF_STREAM)?;
        self.coder.finish()?;
        debug!("finished stream after {} blocks", self.blocks);
        Ok(self.coder)
    }
}
