//! Adaptive binary range coder.
//!
//! The coder follows the LZMA design:
//! - 32-bit range tracking
//! - Normalization when range drops below 2^24
//! - 11-bit probability model (1024 = 50%)
//!
//! Multi-symbol contexts are coded as a bit tree of adaptive binary
//! probabilities, MSB first, followed by the context's raw low bits.

use crate::error::{BscError, Result};
use crate::traits::{ContextSpec, EntropyDecoder, EntropyEncoder};
use std::io::{Read, Write};

/// Number of bits in probability model.
pub const PROB_BITS: u32 = 11;

/// Probability representing 50%.
pub const PROB_INIT: u16 = 1 << (PROB_BITS - 1);

/// Maximum probability value.
pub const PROB_MAX: u16 = 1 << PROB_BITS;

/// Top value for range normalization.
const TOP_VALUE: u32 = 1 << 24;

/// Encoded bytes are handed to the writer once this many are buffered.
const DRAIN_THRESHOLD: usize = 64 * 1024;

/// Adaptive context model for one symbol class.
#[derive(Debug, Clone)]
pub struct AdaptiveModel {
    num_symbols: u32,
    modeled_bits: u32,
    raw_bits: u32,
    shift: u32,
    /// Bit-tree probabilities, indexed from 1.
    probs: Vec<u16>,
}

impl AdaptiveModel {
    /// Build a model with every probability at 50%.
    pub fn new(spec: ContextSpec) -> Self {
        let modeled_bits = spec.modeled_bits();
        Self {
            num_symbols: spec.num_symbols.max(1),
            modeled_bits,
            raw_bits: spec.raw_bits(),
            shift: spec.adaptation_shift(),
            probs: vec![PROB_INIT; 1 << modeled_bits],
        }
    }

    /// Alphabet size of this model.
    pub fn num_symbols(&self) -> u32 {
        self.num_symbols
    }
}

/// Range encoder writing to any `Write` sink.
#[derive(Debug)]
pub struct RangeEncoder<W: Write> {
    writer: W,
    /// Finished bytes not yet handed to the writer.
    buffer: Vec<u8>,
    /// Current range.
    range: u32,
    /// Low value.
    low: u64,
    /// Cache byte.
    cache: u8,
    /// Cache size.
    cache_size: u64,
    /// Total bytes produced so far.
    bytes_out: u64,
    finished: bool,
}

impl<W: Write> RangeEncoder<W> {
    /// Create a new range encoder.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(DRAIN_THRESHOLD),
            range: 0xFFFF_FFFF,
            low: 0,
            cache: 0,
            cache_size: 1,
            bytes_out: 0,
            finished: false,
        }
    }

    /// Shift low and emit bytes, propagating any pending carry.
    fn shift_low(&mut self) {
        if self.low < 0xFF00_0000 || self.low > 0xFFFF_FFFF {
            let mut tmp = self.cache;
            let carry = (self.low >> 32) as u8;

            loop {
                self.buffer.push(tmp.wrapping_add(carry));
                self.bytes_out += 1;
                tmp = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }

            self.cache = (self.low >> 24) as u8;
        }

        self.cache_size += 1;
        self.low = (self.low << 8) & 0xFFFF_FFFF;
    }

    fn normalize(&mut self) {
        while self.range < TOP_VALUE {
            self.range <<= 8;
            self.shift_low();
        }
    }

    /// Encode a single bit with an adaptive probability.
    pub fn encode_bit(&mut self, prob: &mut u16, shift: u32, bit: u32) {
        let bound = (self.range >> PROB_BITS) * (*prob as u32);

        if bit == 0 {
            self.range = bound;
            *prob += (PROB_MAX - *prob) >> shift;
        } else {
            self.low += bound as u64;
            self.range -= bound;
            *prob -= *prob >> shift;
        }

        self.normalize();
    }

    /// Encode a bit with fixed 50% probability.
    pub fn encode_direct_bit(&mut self, bit: u32) {
        self.range >>= 1;
        if bit != 0 {
            self.low += self.range as u64;
        }
        self.normalize();
    }

    /// Encode `count` raw bits, MSB first.
    pub fn encode_direct_bits(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            self.encode_direct_bit((value >> i) & 1);
        }
    }

    fn drain(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Total number of bytes produced, including those still buffered.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_out
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the encoder and return the writer.
    ///
    /// Call [`EntropyEncoder::finish`] first; unflushed state is discarded.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EntropyEncoder for RangeEncoder<W> {
    type Context = AdaptiveModel;

    fn make_context(&mut self, spec: ContextSpec) -> AdaptiveModel {
        AdaptiveModel::new(spec)
    }

    fn encode(&mut self, symbol: u32, context: &mut AdaptiveModel) -> Result<()> {
        debug_assert!(!self.finished, "encode after finish");
        debug_assert!(symbol < context.num_symbols, "symbol outside alphabet");

        let high = symbol >> context.raw_bits;
        let mut index = 1usize;
        for i in (0..context.modeled_bits).rev() {
            let bit = (high >> i) & 1;
            self.encode_bit(&mut context.probs[index], context.shift, bit);
            index = (index << 1) | bit as usize;
        }
        self.encode_direct_bits(symbol, context.raw_bits);

        if self.buffer.len() >= DRAIN_THRESHOLD {
            self.drain()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        for _ in 0..5 {
            self.shift_low();
        }
        self.finished = true;
        self.drain()?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Range decoder reading from any `Read` source.
#[derive(Debug)]
pub struct RangeDecoder<R: Read> {
    reader: R,
    range: u32,
    code: u32,
}

impl<R: Read> RangeDecoder<R> {
    /// Create a new range decoder, consuming the 5-byte stream preamble.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut preamble = [0u8; 5];
        read_exact(&mut reader, &mut preamble)?;

        if preamble[0] != 0x00 {
            return Err(BscError::invalid_header("Invalid range coder start byte"));
        }

        let code = u32::from_be_bytes([preamble[1], preamble[2], preamble[3], preamble[4]]);

        Ok(Self {
            reader,
            range: 0xFFFF_FFFF,
            code,
        })
    }

    fn normalize(&mut self) -> Result<()> {
        while self.range < TOP_VALUE {
            let mut buf = [0u8; 1];
            read_exact(&mut self.reader, &mut buf)?;
            self.range <<= 8;
            self.code = (self.code << 8) | buf[0] as u32;
        }
        Ok(())
    }

    /// Decode a single bit with an adaptive probability.
    pub fn decode_bit(&mut self, prob: &mut u16, shift: u32) -> Result<u32> {
        self.normalize()?;

        let bound = (self.range >> PROB_BITS) * (*prob as u32);

        if self.code < bound {
            self.range = bound;
            *prob += (PROB_MAX - *prob) >> shift;
            Ok(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob -= *prob >> shift;
            Ok(1)
        }
    }

    /// Decode a bit with fixed 50% probability.
    pub fn decode_direct_bit(&mut self) -> Result<u32> {
        self.normalize()?;

        self.range >>= 1;
        self.code = self.code.wrapping_sub(self.range);

        let bit = if (self.code as i32) < 0 {
            self.code = self.code.wrapping_add(self.range);
            0
        } else {
            1
        };

        Ok(bit)
    }

    /// Decode `count` raw bits, MSB first.
    pub fn decode_direct_bits(&mut self, count: u32) -> Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            result = (result << 1) | self.decode_direct_bit()?;
        }
        Ok(result)
    }

    /// Consume the decoder and return the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> EntropyDecoder for RangeDecoder<R> {
    type Context = AdaptiveModel;

    fn make_context(&mut self, spec: ContextSpec) -> AdaptiveModel {
        AdaptiveModel::new(spec)
    }

    fn decode(&mut self, context: &mut AdaptiveModel) -> Result<u32> {
        let mut index = 1usize;
        for _ in 0..context.modeled_bits {
            let bit = self.decode_bit(&mut context.probs[index], context.shift)?;
            index = (index << 1) | bit as usize;
        }
        let high = (index as u32) - (1 << context.modeled_bits);
        let low = self.decode_direct_bits(context.raw_bits)?;
        let symbol = (high << context.raw_bits) | low;

        if symbol >= context.num_symbols {
            return Err(BscError::invalid_symbol(symbol, context.num_symbols));
        }
        Ok(symbol)
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            BscError::unexpected_eof(buf.len())
        } else {
            e.into()
        }
    })
}
