//! Block decoder.

use crate::bwt;
use crate::config::CodecConfig;
use crate::mtf::MtfRecoder;
use log::debug;
use oxibsc_core::error::{BscError, Result};
use oxibsc_core::traits::EntropyDecoder;

/// Outcome of one [`BlockDecoder::decode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// A block of this many bytes was written to the start of the buffer.
    Block(usize),
    /// The buffer is smaller than the block size. Nothing was read.
    NeedsOutput {
        /// Minimum buffer length.
        needed: usize,
    },
    /// The end-of-stream marker was reached.
    EndOfStream,
}

/// Decodes blocks written by [`crate::BlockEncoder`].
pub struct BlockDecoder<D: EntropyDecoder> {
    coder: D,
    config: CodecConfig,
    last: Vec<u8>,
    successor: Vec<u32>,
    recoder: MtfRecoder<D::Context>,
    blocks: u64,
    finished: bool,
}

impl<D: EntropyDecoder> BlockDecoder<D> {
    /// Set up all scratch state for `config` around `coder`.
    pub fn start(mut coder: D, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let recoder = MtfRecoder::new(|spec| coder.make_context(spec));
        Ok(Self {
            coder,
            config,
            last: Vec::with_capacity(config.block_size),
            successor: Vec::with_capacity(config.block_size),
            recoder,
            blocks: 0,
            finished: false,
        })
    }

    /// Decode the next block into the front of `buffer`.
    ///
    /// `buffer` must hold at least `block_size` bytes, otherwise
    /// [`DecodeStatus::NeedsOutput`] is returned and the stream is untouched.
    pub fn decode(&mut self, buffer: &mut [u8]) -> Result<DecodeStatus> {
        if self.finished {
            return Ok(DecodeStatus::EndOfStream);
        }
        let block_size = self.config.block_size;
        if buffer.len() < block_size {
            return Ok(DecodeStatus::NeedsOutput { needed: block_size });
        }

        let origin = self.recoder.decode_word(&mut self.coder)?;
        if origin as usize >= block_size {
            debug!("end of stream after {} blocks", self.blocks);
            self.finished = true;
            return Ok(DecodeStatus::EndOfStream);
        }

        self.last.clear();
        self.recoder
            .decode_block(&mut self.coder, &mut self.last, block_size, self.blocks)?;
        let len = self.last.len();
        if len == 0 {
            return Err(BscError::corrupted(self.blocks, "empty block"));
        }

        let out = &mut buffer[..len];
        bwt::undo_transform(&self.last, origin, &mut self.successor, out)?;

        if self.config.checksum {
            let expected = self.recoder.decode_word(&mut self.coder)?;
            let computed = crc32fast::hash(out);
            if expected != computed {
                return Err(BscError::crc_mismatch(self.blocks, expected, computed));
            }
        }

        debug!("decoded block {} ({} bytes, origin {})", self.blocks, len, origin);
        self.blocks += 1;
        Ok(DecodeStatus::Block(len))
    }

    /// Number of blocks decoded so far.
    pub fn blocks_read(&self) -> u64 {
        self.blocks
    }

    /// Whether the end-of-stream marker has been read.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Configuration the decoder was started with.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Consume the decoder and return the entropy decoder.
    pub fn into_inner(self) -> D {
        self.coder
    }
}
