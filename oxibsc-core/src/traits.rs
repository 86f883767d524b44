//! Entropy coder traits.
//!
//! The block-sorting codec never looks inside a probability model. It asks the
//! coder for a context once, then feeds symbols through it. Any coder that
//! implements these traits can sit under the codec: the adaptive range coder
//! in [`crate::range_coder`] for real streams, or the recorder in
//! [`crate::trace`] for tests.

use crate::error::Result;

/// Shape of one adaptive context model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSpec {
    /// Size of the symbol alphabet. Symbols are `0..num_symbols`.
    pub num_symbols: u32,
    /// Number of low symbol bits coded without modelling.
    pub extra_bits: u32,
    /// Rough number of symbols over which the model adapts.
    pub adaptation_period: u32,
}

impl ContextSpec {
    /// Create a context specification.
    pub const fn new(num_symbols: u32, extra_bits: u32, adaptation_period: u32) -> Self {
        Self {
            num_symbols,
            extra_bits,
            adaptation_period,
        }
    }

    /// A context whose `bits`-bit symbols are all sent as raw bits.
    pub const fn bypass(bits: u32) -> Self {
        Self::new(1 << bits, bits, 1)
    }

    /// Number of bits needed to represent every symbol of the alphabet.
    pub fn symbol_bits(&self) -> u32 {
        if self.num_symbols <= 1 {
            0
        } else {
            u32::BITS - (self.num_symbols - 1).leading_zeros()
        }
    }

    /// Number of bits coded through the adaptive bit tree.
    pub fn modeled_bits(&self) -> u32 {
        self.symbol_bits().saturating_sub(self.extra_bits)
    }

    /// Number of bits coded as raw bits.
    pub fn raw_bits(&self) -> u32 {
        self.symbol_bits() - self.modeled_bits()
    }

    /// Probability update shift derived from the adaptation period.
    pub fn adaptation_shift(&self) -> u32 {
        self.adaptation_period.max(1).ilog2().clamp(2, 8)
    }
}

/// Encoding half of an adaptive entropy coder.
pub trait EntropyEncoder {
    /// Opaque per-context model state.
    type Context;

    /// Build a fresh context model.
    fn make_context(&mut self, spec: ContextSpec) -> Self::Context;

    /// Encode `symbol` through `context`.
    fn encode(&mut self, symbol: u32, context: &mut Self::Context) -> Result<()>;

    /// Flush all pending output. No symbol may be encoded afterwards.
    fn finish(&mut self) -> Result<()>;
}

/// Decoding half of an adaptive entropy coder.
pub trait EntropyDecoder {
    /// Opaque per-context model state.
    type Context;

    /// Build a fresh context model. Must mirror the encoder's call sequence.
    fn make_context(&mut self, spec: ContextSpec) -> Self::Context;

    /// Decode the next symbol through `context`.
    fn decode(&mut self, context: &mut Self::Context) -> Result<u32>;
}
