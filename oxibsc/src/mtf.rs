//! Move-to-front recoding of the transformed block.
//!
//! Each byte of the BWT output becomes its rank in a self-organizing list.
//! Ranks are then coded as symbols of one small alphabet:
//!
//! | Symbol | Meaning |
//! |---|---|
//! | `ZRUN0`, `ZRUN1` | One digit of a run of rank 0 |
//! | `2..=9` | Magnitude class `c` of a rank `k` in `2^c..2^(c+1)` |
//! | `EOB` | End of block |
//!
//! A class above 0 is followed by `k - 2^c` through that class's own offset
//! context. A run of `n` zeros is sent as the binary digits of `n + 1`, least
//! significant first, without the leading one. Every digit string maps to
//! exactly one run length, so no terminator is needed.
//!
//! The list and the context models carry over from one block to the next.

use oxibsc_core::error::{BscError, Result};
use oxibsc_core::traits::{ContextSpec, EntropyDecoder, EntropyEncoder};

/// Run digit 0.
pub const ZRUN0: u32 = 0;
/// Run digit 1.
pub const ZRUN1: u32 = 1;
/// First magnitude class symbol.
pub const CLASS_BASE: u32 = 2;
/// Number of magnitude classes (ranks 1 to 255).
pub const NUM_CLASSES: u32 = 8;
/// End-of-block symbol.
pub const EOB: u32 = CLASS_BASE + NUM_CLASSES;
/// Size of the rank alphabet.
pub const NUM_SYMBOLS: u32 = EOB + 1;

/// Longest zero run a decoder accepts, in digits.
const MAX_RUN_DIGITS: u32 = 40;

const SYMBOL_PERIOD: u32 = 32;
const OFFSET_PERIOD: u32 = 64;

/// Self-organizing list of the 256 byte values.
#[derive(Debug, Clone)]
pub struct MtfList {
    order: [u8; 256],
}

impl Default for MtfList {
    fn default() -> Self {
        Self::new()
    }
}

impl MtfList {
    /// Identity ordering.
    pub fn new() -> Self {
        let mut order = [0u8; 256];
        for (i, slot) in order.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { order }
    }

    /// Current ordering, front first.
    pub fn as_slice(&self) -> &[u8; 256] {
        &self.order
    }

    /// Byte at rank 0.
    pub fn front(&self) -> u8 {
        self.order[0]
    }

    /// Rank of `byte`, moving it to the front.
    pub fn encode(&mut self, byte: u8) -> u8 {
        let mut prev = self.order[0];
        if prev == byte {
            return 0;
        }
        let mut k = 0;
        loop {
            k += 1;
            let cur = self.order[k];
            self.order[k] = prev;
            prev = cur;
            if cur == byte {
                break;
            }
        }
        self.order[0] = byte;
        k as u8
    }

    /// Byte at `rank`, moving it to the front.
    pub fn decode(&mut self, rank: u8) -> u8 {
        let k = rank as usize;
        let byte = self.order[k];
        self.order.copy_within(0..k, 1);
        self.order[0] = byte;
        byte
    }
}

/// Magnitude class of a non-zero rank.
#[inline]
fn rank_class(rank: u8) -> u32 {
    debug_assert!(rank > 0);
    u8::BITS - 1 - rank.leading_zeros()
}

#[derive(Debug)]
struct RankContexts<C> {
    symbols: C,
    /// Offset contexts for classes 1 to 7.
    offsets: Vec<C>,
    /// Raw bytes of origin and checksum words.
    words: C,
}

impl<C> RankContexts<C> {
    fn new(mut make: impl FnMut(ContextSpec) -> C) -> Self {
        let symbols = make(ContextSpec::new(NUM_SYMBOLS, 0, SYMBOL_PERIOD));
        let offsets = (1..NUM_CLASSES)
            .map(|c| make(ContextSpec::new(1 << c, c.saturating_sub(4), OFFSET_PERIOD)))
            .collect();
        let words = make(ContextSpec::bypass(8));
        Self {
            symbols,
            offsets,
            words,
        }
    }
}

/// One decoded unit of the rank stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Run(u64),
    Rank(u8),
    End,
}

/// Move-to-front state plus the rank contexts of one stream.
#[derive(Debug)]
pub struct MtfRecoder<C> {
    list: MtfList,
    zero_run: u64,
    /// Symbol read past the end of a zero run.
    lookahead: Option<u32>,
    contexts: RankContexts<C>,
}

impl<C> MtfRecoder<C> {
    /// Create a recoder, building its contexts through `make`.
    ///
    /// Encoder and decoder create their contexts in the same order.
    pub fn new(make: impl FnMut(ContextSpec) -> C) -> Self {
        Self {
            list: MtfList::new(),
            zero_run: 0,
            lookahead: None,
            contexts: RankContexts::new(make),
        }
    }

    /// Current move-to-front list.
    pub fn list(&self) -> &MtfList {
        &self.list
    }

    /// Recode a whole transformed block and close it with `EOB`.
    pub fn encode_block<E>(&mut self, coder: &mut E, bytes: &[u8]) -> Result<()>
    where
        E: EntropyEncoder<Context = C>,
    {
        for &byte in bytes {
            let rank = self.list.encode(byte);
            self.encode_rank(coder, rank)?;
        }
        self.end_block(coder)
    }

    /// Code a sequence of raw ranks and close it with `EOB`.
    pub fn encode_ranks<E>(&mut self, coder: &mut E, ranks: &[u8]) -> Result<()>
    where
        E: EntropyEncoder<Context = C>,
    {
        for &rank in ranks {
            self.encode_rank(coder, rank)?;
        }
        self.end_block(coder)
    }

    /// Code one rank. Zero ranks are held back until the run ends.
    pub fn encode_rank<E>(&mut self, coder: &mut E, rank: u8) -> Result<()>
    where
        E: EntropyEncoder<Context = C>,
    {
        if rank == 0 {
            self.zero_run += 1;
            return Ok(());
        }
        self.flush_zero_run(coder)?;

        let class = rank_class(rank);
        coder.encode(CLASS_BASE + class, &mut self.contexts.symbols)?;
        if class > 0 {
            let offset = rank as u32 - (1 << class);
            coder.encode(offset, &mut self.contexts.offsets[class as usize - 1])?;
        }
        Ok(())
    }

    /// Flush the pending zero run and emit `EOB`.
    pub fn end_block<E>(&mut self, coder: &mut E) -> Result<()>
    where
        E: EntropyEncoder<Context = C>,
    {
        self.flush_zero_run(coder)?;
        coder.encode(EOB, &mut self.contexts.symbols)
    }

    fn flush_zero_run<E>(&mut self, coder: &mut E) -> Result<()>
    where
        E: EntropyEncoder<Context = C>,
    {
        let mut value = self.zero_run + 1;
        while value > 1 {
            coder.encode(ZRUN0 + (value & 1) as u32, &mut self.contexts.symbols)?;
            value >>= 1;
        }
        self.zero_run = 0;
        Ok(())
    }

    /// Send a 32-bit word as four raw bytes, most significant first.
    pub fn encode_word<E>(&mut self, coder: &mut E, word: u32) -> Result<()>
    where
        E: EntropyEncoder<Context = C>,
    {
        for byte in word.to_be_bytes() {
            coder.encode(byte as u32, &mut self.contexts.words)?;
        }
        Ok(())
    }

    /// Read a word written by [`MtfRecoder::encode_word`].
    pub fn decode_word<D>(&mut self, coder: &mut D) -> Result<u32>
    where
        D: EntropyDecoder<Context = C>,
    {
        let mut word = 0u32;
        for _ in 0..4 {
            word = (word << 8) | coder.decode(&mut self.contexts.words)?;
        }
        Ok(word)
    }

    /// Decode one block of bytes into `out`, up to `EOB`.
    ///
    /// Fails if the block would grow past `limit` bytes. `block` only labels
    /// errors.
    pub fn decode_block<D>(
        &mut self,
        coder: &mut D,
        out: &mut Vec<u8>,
        limit: usize,
        block: u64,
    ) -> Result<()>
    where
        D: EntropyDecoder<Context = C>,
    {
        loop {
            match self.decode_token(coder, block)? {
                Token::Run(run) => {
                    let run = check_room(out.len(), run, limit, block)?;
                    let front = self.list.front();
                    out.resize(out.len() + run, front);
                }
                Token::Rank(rank) => {
                    check_room(out.len(), 1, limit, block)?;
                    out.push(self.list.decode(rank));
                }
                Token::End => return Ok(()),
            }
        }
    }

    /// Decode raw ranks written by [`MtfRecoder::encode_ranks`].
    pub fn decode_ranks<D>(
        &mut self,
        coder: &mut D,
        out: &mut Vec<u8>,
        limit: usize,
        block: u64,
    ) -> Result<()>
    where
        D: EntropyDecoder<Context = C>,
    {
        loop {
            match self.decode_token(coder, block)? {
                Token::Run(run) => {
                    let run = check_room(out.len(), run, limit, block)?;
                    out.resize(out.len() + run, 0);
                }
                Token::Rank(rank) => {
                    check_room(out.len(), 1, limit, block)?;
                    out.push(rank);
                }
                Token::End => return Ok(()),
            }
        }
    }

    fn next_symbol<D>(&mut self, coder: &mut D) -> Result<u32>
    where
        D: EntropyDecoder<Context = C>,
    {
        match self.lookahead.take() {
            Some(symbol) => Ok(symbol),
            None => coder.decode(&mut self.contexts.symbols),
        }
    }

    fn decode_token<D>(&mut self, coder: &mut D, block: u64) -> Result<Token>
    where
        D: EntropyDecoder<Context = C>,
    {
        let mut symbol = self.next_symbol(coder)?;

        if symbol <= ZRUN1 {
            let mut run = 0u64;
            let mut digits = 0;
            while symbol <= ZRUN1 {
                if digits == MAX_RUN_DIGITS {
                    return Err(BscError::corrupted(block, "zero run too long"));
                }
                run += (symbol as u64 + 1) << digits;
                digits += 1;
                symbol = coder.decode(&mut self.contexts.symbols)?;
            }
            self.lookahead = Some(symbol);
            return Ok(Token::Run(run));
        }

        match symbol {
            EOB => Ok(Token::End),
            s if s < EOB => {
                let class = s - CLASS_BASE;
                let rank = if class == 0 {
                    1
                } else {
                    let offset = coder.decode(&mut self.contexts.offsets[class as usize - 1])?;
                    (1 << class) + offset
                };
                u8::try_from(rank)
                    .map(Token::Rank)
                    .map_err(|_| BscError::corrupted(block, format!("rank {rank} out of range")))
            }
            s => Err(BscError::invalid_symbol(s, NUM_SYMBOLS)),
        }
    }
}

fn check_room(len: usize, count: u64, limit: usize, block: u64) -> Result<usize> {
    let room = limit.saturating_sub(len) as u64;
    if count > room {
        return Err(BscError::corrupted(
            block,
            format!("block grows past {limit} bytes"),
        ));
    }
    Ok(count as usize)
}
