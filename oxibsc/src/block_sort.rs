//! BWT rotation sorter.
//!
//! Large blocks are sorted bucket by bucket:
//!
//! 1. A counting sort on the first two bytes splits the rotations into
//!    65536 small buckets `[a,b]`.
//! 2. The 256 leading-byte buckets `[ss,*]` are visited smallest first.
//! 3. Inside `[ss,*]` every `[ss,j]` with `j != ss` is sorted from depth 2.
//!    The diagonal bucket `[ss,ss]` is then filled without comparisons,
//!    since each of its rotations is `ss` followed by an already ordered
//!    rotation of `[ss,*]`.
//! 4. The finished bucket is written back into the stripe as rank tags and
//!    its rotations seed the order of every `[c,ss]` that is still open.
//!
//! Blocks shorter than the stripe mirror are insertion sorted directly.

use crate::small_sort::{insertion_sort, multikey_quick_sort};
use crate::stripe::{MIRROR, Stripe};
use log::trace;

/// Number of two-byte radix buckets.
const NUM_BUCKETS: usize = 1 << 16;

/// Reusable state for sorting the rotations of one block at a time.
#[derive(Debug)]
pub struct BlockSorter {
    /// Rotation offsets in sorted order after [`BlockSorter::sort`].
    ptr: Vec<u32>,
    /// Start of every `[a,b]` bucket in `ptr`, plus the block length.
    buckets: Vec<u32>,
    /// Whether `[a,b]` is in its final order.
    sorted: Vec<bool>,
    stripe: Stripe,
}

impl BlockSorter {
    /// Allocate sorting state for blocks of up to `block_size` bytes.
    pub fn new(block_size: usize) -> Self {
        Self {
            ptr: Vec::with_capacity(block_size),
            buckets: vec![0; NUM_BUCKETS + 1],
            sorted: vec![false; NUM_BUCKETS],
            stripe: Stripe::with_capacity(block_size),
        }
    }

    /// Rotation offsets of the last sorted block, in lexicographic order.
    pub fn rotation_index(&self) -> &[u32] {
        &self.ptr
    }

    /// Sort every rotation of `block` and return the origin row.
    ///
    /// The origin is the row holding the rotation that starts at offset 1,
    /// so its last byte is the first byte of the block.
    pub fn sort(&mut self, block: &[u8]) -> u32 {
        let n = block.len();
        self.ptr.clear();
        if n == 0 {
            return 0;
        }

        if n < MIRROR {
            self.ptr.extend(0..n as u32);
            insertion_sort(block, &mut self.ptr);
        } else {
            self.main_sort(block);
        }

        debug_assert!(is_permutation(&self.ptr), "rotation index is not a permutation");

        let target = (1 % n) as u32;
        self.ptr
            .iter()
            .position(|&p| p == target)
            .map_or(0, |row| row as u32)
    }

    fn main_sort(&mut self, block: &[u8]) {
        let n = block.len();
        self.stripe.build(block);
        self.radix_presort(n);

        let big_order = bucket_order(&self.buckets);
        let mut big_done = [false; 256];
        self.sorted.fill(false);

        for (i, &ss) in big_order.iter().enumerate() {
            let ss_base = (ss as usize) << 8;

            // Every [ss,j] except the diagonal
            for j in 0..256 {
                let sb = ss_base + j;
                if j == ss as usize || self.sorted[sb] {
                    continue;
                }
                let lo = self.buckets[sb] as usize;
                let hi = self.buckets[sb + 1] as usize;
                if hi - lo > 1 {
                    trace!("sorting bucket [{ss:#04x},{j:#04x}] of {} rotations", hi - lo);
                    multikey_quick_sort(&mut self.ptr[lo..hi], &self.stripe, 2);
                }
                self.sorted[sb] = true;
            }

            self.fill_diagonal(block, ss);
            big_done[ss as usize] = true;

            let big_lo = self.buckets[ss_base] as usize;
            let big_hi = self.buckets[ss_base + 256] as usize;
            // No comparison ever reaches the last bucket's tags
            if i + 1 < big_order.len() {
                self.stripe.retag(ss, &self.ptr[big_lo..big_hi]);
            }

            self.distribute_predecessors(block, ss, &big_done);
        }
    }

    /// Counting sort of all rotations on their first two bytes.
    fn radix_presort(&mut self, n: usize) {
        self.buckets.fill(0);
        for p in 0..n {
            self.buckets[(self.stripe.word(p) >> 16) as usize] += 1;
        }
        for k in 1..NUM_BUCKETS {
            self.buckets[k] += self.buckets[k - 1];
        }
        // buckets[k] now ends bucket k; filling downwards leaves its start
        self.ptr.resize(n, 0);
        for p in (0..n).rev() {
            let k = (self.stripe.word(p) >> 16) as usize;
            self.buckets[k] -= 1;
            self.ptr[self.buckets[k] as usize] = p as u32;
        }
        self.buckets[NUM_BUCKETS] = n as u32;

        debug_assert!(self.buckets.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Order `[ss,ss]` from the already sorted rest of `[ss,*]`.
    fn fill_diagonal(&mut self, block: &[u8], ss: u8) {
        let n = block.len();
        let ss_base = (ss as usize) << 8;
        let diag = ss_base + ss as usize;
        let big_lo = self.buckets[ss_base] as usize;
        let big_hi = self.buckets[ss_base + 256] as usize;
        let diag_lo = self.buckets[diag] as usize;
        let diag_hi = self.buckets[diag + 1] as usize;

        // Rotations below the diagonal, then those appended, in order
        let mut fill_lo = diag_lo;
        let mut p = big_lo;
        while p < fill_lo {
            let k = predecessor(self.ptr[p], n);
            if block[k as usize] == ss {
                self.ptr[fill_lo] = k;
                fill_lo += 1;
            }
            p += 1;
        }

        // Same from the top end downwards
        let mut fill_hi = diag_hi;
        let mut p = big_hi;
        while p > fill_hi {
            p -= 1;
            let k = predecessor(self.ptr[p], n);
            if block[k as usize] == ss {
                fill_hi -= 1;
                self.ptr[fill_hi] = k;
            }
        }

        debug_assert!(
            diagonal_filled((fill_lo, fill_hi), (diag_lo, diag_hi), (big_lo, big_hi), n),
            "diagonal bucket {ss:#04x} not filled: {fill_lo}..{fill_hi}"
        );
        self.sorted[diag] = true;
    }

    /// Seed every open `[c,ss]` with the predecessors of `[ss,*]`, in order.
    fn distribute_predecessors(&mut self, block: &[u8], ss: u8, big_done: &[bool; 256]) {
        let n = block.len();
        let ss_base = (ss as usize) << 8;
        let big_lo = self.buckets[ss_base] as usize;
        let big_hi = self.buckets[ss_base + 256] as usize;

        let mut cursor = [0u32; 256];
        for (c, slot) in cursor.iter_mut().enumerate() {
            *slot = self.buckets[(c << 8) + ss as usize];
        }

        for p in big_lo..big_hi {
            let k = predecessor(self.ptr[p], n);
            let c = block[k as usize] as usize;
            if !big_done[c] {
                self.ptr[cursor[c] as usize] = k;
                cursor[c] += 1;
            }
        }

        for c in 0..256 {
            let sb = (c << 8) + ss as usize;
            debug_assert!(
                big_done[c] || cursor[c] == self.buckets[sb + 1],
                "bucket [{c:#04x},{ss:#04x}] not filled"
            );
            self.sorted[sb] = true;
        }
    }
}

#[inline]
fn predecessor(offset: u32, n: usize) -> u32 {
    if offset == 0 { n as u32 - 1 } else { offset - 1 }
}

/// Whether the two fill cursors of a diagonal bucket met.
///
/// Only a block of one repeated byte leaves the diagonal untouched, and then
/// the diagonal is the whole block.
fn diagonal_filled(
    fill: (usize, usize),
    diag: (usize, usize),
    big: (usize, usize),
    n: usize,
) -> bool {
    fill.0 == fill.1 || (fill == big && diag == big && big.1 - big.0 == n)
}

/// Leading bytes ordered by ascending size of their `[ss,*]` bucket.
fn bucket_order(buckets: &[u32]) -> [u8; 256] {
    let size = |b: u8| {
        let base = (b as usize) << 8;
        buckets[base + 256] - buckets[base]
    };

    let mut order = [0u8; 256];
    for (i, slot) in order.iter_mut().enumerate() {
        *slot = i as u8;
    }

    let mut h = 1;
    while h <= 256 {
        h = 3 * h + 1;
    }
    loop {
        h /= 3;
        for i in h..256 {
            let value = order[i];
            let key = size(value);
            let mut j = i;
            while j >= h && size(order[j - h]) > key {
                order[j] = order[j - h];
                j -= h;
            }
            order[j] = value;
        }
        if h == 1 {
            break;
        }
    }
    order
}

fn is_permutation(ptr: &[u32]) -> bool {
    let mut seen = vec![false; ptr.len()];
    ptr.iter().all(|&p| {
        let p = p as usize;
        p < seen.len() && !std::mem::replace(&mut seen[p], true)
    })
}
