//! Packed comparison keys over the cyclic block.
//!
//! `word(p)` holds the four bytes starting at rotation offset `p`, most
//! significant byte first, so comparing two words as integers compares four
//! bytes of the two rotations at once. The first [`MIRROR`] words are repeated
//! past the end of the block, which lets a comparison run a whole batch of
//! words before it has to wrap its cursors.
//!
//! Once every rotation starting with byte `ss` is in its final order, the
//! words at those offsets are rewritten as `ss` followed by a 16-bit rank.
//! A later comparison that reaches two such offsets is then settled by the
//! rank alone instead of walking further along the rotations.

use std::cmp::Ordering;

/// Number of words mirrored past the end of the block.
pub const MIRROR: usize = 64;

/// Words compared per batch before the cursors are wrapped.
const BATCH_WORDS: usize = 16;

/// Width of the rank field in a retagged word.
const TAG_BITS: u32 = 16;

/// Packed 4-byte keys for every rotation offset of a block.
#[derive(Debug, Clone)]
pub struct Stripe {
    words: Vec<u32>,
    len: usize,
    /// Leading bytes whose rotations carry rank tags.
    tagged: [bool; 256],
}

impl Stripe {
    /// Allocate key storage for blocks of up to `block_size` bytes.
    pub fn with_capacity(block_size: usize) -> Self {
        Self {
            words: Vec::with_capacity(block_size + MIRROR),
            len: 0,
            tagged: [false; 256],
        }
    }

    /// Build the keys for `block`. The block must be at least [`MIRROR`] bytes.
    pub fn build(&mut self, block: &[u8]) {
        let n = block.len();
        debug_assert!(n >= MIRROR, "stripe needs at least {MIRROR} bytes");

        self.words.clear();
        self.words.resize(n + MIRROR, 0);
        self.len = n;
        self.tagged = [false; 256];

        // Roll backwards so each byte is loaded once
        let mut word = u32::from_be_bytes([block[0], block[1], block[2], 0]);
        for p in (0..n).rev() {
            word = (word >> 8) | ((block[p] as u32) << 24);
            self.words[p] = word;
        }
        self.words.copy_within(0..MIRROR, n);
    }

    /// Length of the block the keys were built for.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no block has been indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw word at `pos`, which may reach into the mirrored tail.
    #[inline]
    pub fn word(&self, pos: usize) -> u32 {
        self.words[pos]
    }

    /// Key of rotation `offset` after skipping `depth` bytes.
    #[inline]
    pub fn key(&self, offset: u32, depth: usize) -> u32 {
        debug_assert!(depth < self.len);
        let mut pos = offset as usize + depth;
        if pos >= self.len {
            pos -= self.len;
        }
        self.words[pos]
    }

    /// Whether `word` is a rank tag rather than four literal bytes.
    #[inline]
    pub fn is_tagged(&self, word: u32) -> bool {
        self.tagged[(word >> 24) as usize]
    }

    /// Compare the rotations starting at `a` and `b`, whose first `depth`
    /// bytes are already known to be equal.
    ///
    /// Returns `Equal` only for identical offsets or when a full rotation
    /// compares equal, which happens only for periodic blocks.
    pub fn compare(&self, a: u32, b: u32, depth: usize) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }

        let n = self.len;
        let mut pa = (a as usize + depth) % n;
        let mut pb = (b as usize + depth) % n;
        let mut compared = 0usize;

        while compared < n {
            for _ in 0..BATCH_WORDS {
                let wa = self.words[pa];
                let wb = self.words[pb];
                if wa != wb {
                    return wa.cmp(&wb);
                }
                // Equal tags only pin down the leading byte
                let step = if self.is_tagged(wa) { 1 } else { 4 };
                pa += step;
                pb += step;
                compared += step;
            }
            if pa >= n {
                pa -= n;
            }
            if pb >= n {
                pb -= n;
            }
        }

        Ordering::Equal
    }

    /// Replace the words of every rotation starting with `ss` by rank tags.
    ///
    /// `bucket` lists those rotations in final sorted order. Buckets larger
    /// than the 16-bit tag field share tags between neighbouring ranks.
    pub fn retag(&mut self, ss: u8, bucket: &[u32]) {
        let shift = tag_shift(bucket.len());
        let n = self.len;

        for (rank, &offset) in bucket.iter().enumerate() {
            let tag = ((ss as u32) << 24) | (((rank >> shift) as u32) << 8);
            let p = offset as usize;
            self.words[p] = tag;
            if p < MIRROR {
                self.words[p + n] = tag;
            }
        }
        self.tagged[ss as usize] = true;
    }
}

/// Smallest shift that fits every rank of a bucket into the tag field.
fn tag_shift(bucket_len: usize) -> u32 {
    let max_rank = bucket_len.saturating_sub(1);
    let mut shift = 0;
    while (max_rank >> shift) >= (1 << TAG_BITS) {
        shift += 1;
    }
    shift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cyclic_cmp(block: &[u8], a: usize, b: usize) -> Ordering {
        block[a..]
            .iter()
            .chain(&block[..a])
            .cmp(block[b..].iter().chain(&block[..b]))
    }

    fn sample_block(len: usize) -> Vec<u8> {
        let mut seed = 99u32;
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                b"abc"[(seed >> 16) as usize % 3]
            })
            .collect()
    }

    #[test]
    fn test_build_packs_forward_bytes() {
        let block: Vec<u8> = (0..100u8).collect();
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        assert_eq!(stripe.word(0), 0x0001_0203);
        assert_eq!(stripe.word(50), u32::from_be_bytes([50, 51, 52, 53]));
        // Wraps around the end of the block
        assert_eq!(stripe.word(98), u32::from_be_bytes([98, 99, 0, 1]));
        // Mirrored tail
        assert_eq!(stripe.word(100), stripe.word(0));
        assert_eq!(stripe.word(163), stripe.word(63));
    }

    #[test]
    fn test_key_wraps() {
        let block: Vec<u8> = (0..64u8).collect();
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);
        assert_eq!(stripe.key(62, 4), stripe.word(2));
        assert_eq!(stripe.key(10, 2), stripe.word(12));
    }

    #[test]
    fn test_compare_matches_bytewise() {
        let block = sample_block(300);
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        for a in (0..300).step_by(7) {
            for b in (0..300).step_by(11) {
                assert_eq!(
                    stripe.compare(a as u32, b as u32, 0),
                    cyclic_cmp(&block, a, b),
                    "offsets {a} and {b}"
                );
            }
        }
    }

    #[test]
    fn test_compare_periodic_block() {
        let block = b"abcd".repeat(32);
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        assert_eq!(stripe.compare(0, 4, 0), Ordering::Equal);
        assert_eq!(stripe.compare(0, 1, 0), Ordering::Less);
        assert_eq!(stripe.compare(5, 1, 3), Ordering::Equal);
    }

    #[test]
    fn test_compare_after_retag() {
        let block = sample_block(200);
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        // Sort the 'a' rotations by brute force and tag them
        let mut bucket: Vec<u32> = (0..200u32).filter(|&p| block[p as usize] == b'a').collect();
        bucket.sort_by(|&x, &y| cyclic_cmp(&block, x as usize, y as usize));
        stripe.retag(b'a', &bucket);

        for a in (0..200).step_by(3) {
            for b in (0..200).step_by(5) {
                assert_eq!(
                    stripe.compare(a as u32, b as u32, 0),
                    cyclic_cmp(&block, a, b),
                    "offsets {a} and {b}"
                );
            }
        }
    }

    #[test]
    fn test_compare_with_shared_tags() {
        // Roughly 70000 'a' rotations, so neighbouring ranks share a tag
        let n = 140_000;
        let mut seed = 5u64;
        let block: Vec<u8> = (0..n)
            .map(|_| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                b"ab"[(seed >> 40) as usize % 2]
            })
            .collect();
        let mut stripe = Stripe::with_capacity(n);
        stripe.build(&block);

        let mut bucket: Vec<u32> = (0..n as u32).filter(|&p| block[p as usize] == b'a').collect();
        assert!(bucket.len() > 1 << TAG_BITS);
        assert_eq!(tag_shift(bucket.len()), 1);
        bucket.sort_by(|&x, &y| cyclic_cmp(&block, x as usize, y as usize));
        stripe.retag(b'a', &bucket);

        for pair in bucket.chunks_exact(2).step_by(37) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(stripe.word(a as usize), stripe.word(b as usize));
            assert_eq!(stripe.compare(a, b, 0), Ordering::Less, "offsets {a} and {b}");
            assert_eq!(stripe.compare(b, a, 0), Ordering::Greater, "offsets {b} and {a}");
        }

        // Rotations that run into tagged words after a literal prefix
        for a in (0..n).step_by(997) {
            for b in (0..n).step_by(1409) {
                assert_eq!(
                    stripe.compare(a as u32, b as u32, 0),
                    cyclic_cmp(&block, a, b),
                    "offsets {a} and {b}"
                );
            }
        }
    }

    #[test]
    fn test_tag_shift() {
        assert_eq!(tag_shift(0), 0);
        assert_eq!(tag_shift(65_536), 0);
        assert_eq!(tag_shift(65_537), 1);
        assert_eq!(tag_shift(1 << 20), 4);
    }
}
