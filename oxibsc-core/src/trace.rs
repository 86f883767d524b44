//! Deterministic stand-in coder.
//!
//! [`SymbolRecorder`] keeps every `(context, symbol)` pair it is given and
//! [`SymbolReplayer`] hands them back in order. Contexts are numbered in
//! creation order, so a decoder that builds its contexts differently from
//! the encoder, or reads through the wrong one, fails loudly instead of
//! silently desynchronising.

use crate::error::{BscError, Result};
use crate::traits::{ContextSpec, EntropyDecoder, EntropyEncoder};

/// Context handle used by the recording coder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    id: u32,
    num_symbols: u32,
}

impl TraceContext {
    /// Creation index of this context.
    pub fn id(&self) -> u32 {
        self.id
    }
}

/// One recorded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracedSymbol {
    /// Creation index of the context the symbol went through.
    pub context: u32,
    /// The symbol value.
    pub symbol: u32,
}

/// Encoder that records symbols instead of compressing them.
#[derive(Debug, Default)]
pub struct SymbolRecorder {
    contexts: Vec<ContextSpec>,
    symbols: Vec<TracedSymbol>,
    finished: bool,
}

impl SymbolRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols recorded so far.
    pub fn symbols(&self) -> &[TracedSymbol] {
        &self.symbols
    }

    /// Specs of the contexts created so far, in creation order.
    pub fn contexts(&self) -> &[ContextSpec] {
        &self.contexts
    }

    /// Whether [`EntropyEncoder::finish`] was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Turn the recording into a replayer.
    pub fn into_replayer(self) -> SymbolReplayer {
        SymbolReplayer::new(self.symbols)
    }
}

impl EntropyEncoder for SymbolRecorder {
    type Context = TraceContext;

    fn make_context(&mut self, spec: ContextSpec) -> TraceContext {
        let id = self.contexts.len() as u32;
        self.contexts.push(spec);
        TraceContext {
            id,
            num_symbols: spec.num_symbols,
        }
    }

    fn encode(&mut self, symbol: u32, context: &mut TraceContext) -> Result<()> {
        if symbol >= context.num_symbols {
            return Err(BscError::invalid_symbol(symbol, context.num_symbols));
        }
        self.symbols.push(TracedSymbol {
            context: context.id,
            symbol,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Decoder that replays a recording.
#[derive(Debug)]
pub struct SymbolReplayer {
    symbols: Vec<TracedSymbol>,
    position: usize,
    next_context: u32,
}

impl SymbolReplayer {
    /// Create a replayer over recorded symbols.
    pub fn new(symbols: Vec<TracedSymbol>) -> Self {
        Self {
            symbols,
            position: 0,
            next_context: 0,
        }
    }

    /// Number of symbols not yet replayed.
    pub fn remaining(&self) -> usize {
        self.symbols.len() - self.position
    }
}

impl EntropyDecoder for SymbolReplayer {
    type Context = TraceContext;

    fn make_context(&mut self, spec: ContextSpec) -> TraceContext {
        let id = self.next_context;
        self.next_context += 1;
        TraceContext {
            id,
            num_symbols: spec.num_symbols,
        }
    }

    fn decode(&mut self, context: &mut TraceContext) -> Result<u32> {
        let traced = self
            .symbols
            .get(self.position)
            .copied()
            .ok_or_else(|| BscError::unexpected_eof(1))?;

        if traced.context != context.id {
            return Err(BscError::corrupted(
                0,
                format!(
                    "symbol {} recorded in context {} but read through context {}",
                    self.position, traced.context, context.id
                ),
            ));
        }
        self.position += 1;
        Ok(traced.symbol)
    }
}
