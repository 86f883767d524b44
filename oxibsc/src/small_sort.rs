//! Sorters for one bucket of rotation offsets.
//!
//! - [`insertion_sort`] compares rotations byte by byte straight from the
//!   block and is only used for blocks too short to carry a stripe.
//! - [`multikey_quick_sort`] partitions on one stripe word at a time and
//!   hands small or deep ranges to [`quick_sort`], which compares whole
//!   rotations.
//!
//! Both quicksorts are iterative. They push the larger partitions and carry
//! on with the smallest one, so the stack stays logarithmic in the range
//! length. The stacks are growable vectors preallocated to the frame counts
//! below, which cover any bucket of a maximum-size block:
//!
//! - the multi-key sort works next on a part of at most a third of its
//!   range with two frames pending, or on at most half with one pending,
//!   which needs 27 frames for a 16 MiB range;
//! - the plain quicksort works next on at most half its range with one
//!   frame pending, which needs 23 frames.

use crate::stripe::Stripe;
use std::cmp::Ordering;

/// Preallocated frames for the multi-key stack (3 words each).
pub const MULTIKEY_STACK_FRAMES: usize = 32;

/// Preallocated frames for the plain quicksort stack (2 words each).
pub const QUICKSORT_STACK_FRAMES: usize = 32;

/// Ranges at or below this length skip multi-key partitioning.
const SMALL_THRESHOLD: usize = 20;

/// Multi-key partitioning stops at this depth.
const DEPTH_THRESHOLD: usize = 16;

/// Quicksort ranges below this length are insertion sorted.
const INSERTION_THRESHOLD: usize = 8;

/// Ranges above this length use a pseudo-median of nine.
const NINTHER_THRESHOLD: usize = 30;

/// Sort rotation offsets of a short block by direct cyclic byte comparison.
pub fn insertion_sort(block: &[u8], offsets: &mut [u32]) {
    insertion_sort_by(offsets, |a, b| cyclic_cmp(block, a as usize, b as usize));
}

/// Lexicographic comparison of two rotations of `block`.
pub fn cyclic_cmp(block: &[u8], a: usize, b: usize) -> Ordering {
    block[a..]
        .iter()
        .chain(&block[..a])
        .cmp(block[b..].iter().chain(&block[..b]))
}

fn insertion_sort_by(v: &mut [u32], mut cmp: impl FnMut(u32, u32) -> Ordering) {
    for i in 1..v.len() {
        let value = v[i];
        let mut j = i;
        while j > 0 && cmp(v[j - 1], value) == Ordering::Greater {
            v[j] = v[j - 1];
            j -= 1;
        }
        v[j] = value;
    }
}

/// Median of three values under `cmp`.
pub fn median_of_three<T: Copy>(a: T, b: T, c: T, mut cmp: impl FnMut(T, T) -> Ordering) -> T {
    if cmp(a, b) == Ordering::Less {
        if cmp(b, c) == Ordering::Less {
            b
        } else if cmp(a, c) == Ordering::Less {
            c
        } else {
            a
        }
    } else if cmp(a, c) == Ordering::Less {
        a
    } else if cmp(b, c) == Ordering::Less {
        c
    } else {
        b
    }
}

/// Dutch-flag partition of `v` around the value that `ord` compares against.
///
/// Returns `(lt, gt)`: `v[..lt]` is less, `v[lt..gt]` equal, `v[gt..]` greater.
fn partition3(v: &mut [u32], mut ord: impl FnMut(u32) -> Ordering) -> (usize, usize) {
    let mut lt = 0;
    let mut i = 0;
    let mut gt = v.len();

    while i < gt {
        match ord(v[i]) {
            Ordering::Less => {
                v.swap(lt, i);
                lt += 1;
                i += 1;
            }
            Ordering::Greater => {
                gt -= 1;
                v.swap(i, gt);
            }
            Ordering::Equal => i += 1,
        }
    }
    (lt, gt)
}

/// Sort rotation offsets whose first `depth` bytes are equal, comparing
/// whole rotations.
pub fn quick_sort(offsets: &mut [u32], stripe: &Stripe, depth: usize) {
    quick_sort_frames(offsets, stripe, depth);
}

/// [`quick_sort`], returning the deepest the stack grew.
fn quick_sort_frames(offsets: &mut [u32], stripe: &Stripe, depth: usize) -> usize {
    let cmp = |a: u32, b: u32| stripe.compare(a, b, depth);
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(QUICKSORT_STACK_FRAMES);
    stack.push((0, offsets.len()));
    let mut peak = stack.len();

    while let Some((lo, hi)) = stack.pop() {
        if hi - lo < INSERTION_THRESHOLD {
            insertion_sort_by(&mut offsets[lo..hi], cmp);
            continue;
        }

        let pivot = median_of_three(
            offsets[lo],
            offsets[lo + (hi - lo) / 2],
            offsets[hi - 1],
            cmp,
        );
        let (lt, gt) = partition3(&mut offsets[lo..hi], |p| cmp(p, pivot));

        let left = (lo, lo + lt);
        let right = (lo + gt, hi);
        let (larger, smaller) = if left.1 - left.0 > right.1 - right.0 {
            (left, right)
        } else {
            (right, left)
        };
        if larger.1 - larger.0 > 1 {
            stack.push(larger);
        }
        if smaller.1 - smaller.0 > 1 {
            stack.push(smaller);
        }
        peak = peak.max(stack.len());
        debug_assert!(peak <= QUICKSORT_STACK_FRAMES, "quicksort stack at {peak}");
    }
    peak
}

/// Sort rotation offsets whose first `depth` bytes are equal, partitioning
/// on one stripe word per level.
pub fn multikey_quick_sort(offsets: &mut [u32], stripe: &Stripe, depth: usize) {
    multikey_frames(offsets, stripe, depth);
}

/// Deepest stacks reached by one multi-key sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StackPeak {
    multikey: usize,
    quick: usize,
}

/// [`multikey_quick_sort`], returning the deepest both stacks grew.
fn multikey_frames(offsets: &mut [u32], stripe: &Stripe, depth: usize) -> StackPeak {
    let mut stack: Vec<(usize, usize, usize)> = Vec::with_capacity(MULTIKEY_STACK_FRAMES);
    stack.push((0, offsets.len(), depth));
    let mut peak = StackPeak {
        multikey: stack.len(),
        quick: 0,
    };

    while let Some((lo, hi, d)) = stack.pop() {
        if hi - lo <= SMALL_THRESHOLD || d >= DEPTH_THRESHOLD {
            let frames = quick_sort_frames(&mut offsets[lo..hi], stripe, d);
            peak.quick = peak.quick.max(frames);
            continue;
        }

        let range = &mut offsets[lo..hi];
        let pivot = pivot_key(range, stripe, d);
        let (lt, gt) = partition3(range, |p| stripe.key(p, d).cmp(&pivot));

        // A shared tag says nothing past the leading byte
        let next_depth = if stripe.is_tagged(pivot) { d + 1 } else { d + 4 };

        let mut parts = [
            (lo, lo + lt, d),
            (lo + lt, lo + gt, next_depth),
            (lo + gt, hi, d),
        ];
        parts.sort_unstable_by_key(|&(l, h, _)| std::cmp::Reverse(h - l));
        for part in parts {
            if part.1 - part.0 > 1 {
                stack.push(part);
            }
        }
        peak.multikey = peak.multikey.max(stack.len());
        debug_assert!(
            peak.multikey <= MULTIKEY_STACK_FRAMES,
            "multi-key stack at {}",
            peak.multikey
        );
    }
    peak
}

fn pivot_key(range: &[u32], stripe: &Stripe, depth: usize) -> u32 {
    let key = |i: usize| stripe.key(range[i], depth);
    let cmp = |a: u32, b: u32| a.cmp(&b);
    let last = range.len() - 1;
    let mid = range.len() / 2;

    if range.len() > NINTHER_THRESHOLD {
        let step = range.len() / 8;
        let m1 = median_of_three(key(0), key(step), key(2 * step), cmp);
        let m2 = median_of_three(key(mid - step), key(mid), key(mid + step), cmp);
        let m3 = median_of_three(key(last - 2 * step), key(last - step), key(last), cmp);
        median_of_three(m1, m2, m3, cmp)
    } else {
        median_of_three(key(0), key(mid), key(last), cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_block(len: usize, alphabet: &[u8], seed: u32) -> Vec<u8> {
        let mut seed = seed;
        (0..len)
            .map(|_| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                alphabet[(seed >> 16) as usize % alphabet.len()]
            })
            .collect()
    }

    fn assert_sorted(block: &[u8], offsets: &[u32]) {
        for pair in offsets.windows(2) {
            assert_ne!(
                cyclic_cmp(block, pair[0] as usize, pair[1] as usize),
                Ordering::Greater,
                "rotations {} and {} out of order",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_median_of_three() {
        let cmp = |a: u32, b: u32| a.cmp(&b);
        for (a, b, c) in [(1, 2, 3), (1, 3, 2), (2, 1, 3), (2, 3, 1), (3, 1, 2), (3, 2, 1)] {
            assert_eq!(median_of_three(a, b, c, cmp), 2);
        }
        assert_eq!(median_of_three(5, 5, 1, cmp), 5);
    }

    #[test]
    fn test_partition3() {
        let mut v = vec![5, 1, 9, 5, 3, 7, 5];
        let (lt, gt) = partition3(&mut v, |x| x.cmp(&5));
        assert!(v[..lt].iter().all(|&x| x < 5));
        assert!(v[lt..gt].iter().all(|&x| x == 5));
        assert!(v[gt..].iter().all(|&x| x > 5));
        assert_eq!(gt - lt, 3);
    }

    #[test]
    fn test_insertion_sort_banana() {
        let block = b"banana";
        let mut offsets: Vec<u32> = (0..6).collect();
        insertion_sort(block, &mut offsets);
        assert_eq!(offsets, vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn test_quick_sort_full_block() {
        let block = random_block(500, b"ab", 1);
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        let mut offsets: Vec<u32> = (0..500).collect();
        quick_sort(&mut offsets, &stripe, 0);
        assert_sorted(&block, &offsets);
    }

    #[test]
    fn test_multikey_sorts_bucket() {
        let block = random_block(2000, b"acgt", 7);
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        // Every rotation starting with "ca"
        let mut offsets: Vec<u32> = (0..block.len() as u32)
            .filter(|&p| {
                let p = p as usize;
                block[p] == b'c' && block[(p + 1) % block.len()] == b'a'
            })
            .collect();
        assert!(offsets.len() > SMALL_THRESHOLD);

        multikey_quick_sort(&mut offsets, &stripe, 2);
        assert_sorted(&block, &offsets);
    }

    #[test]
    fn test_multikey_long_common_prefixes() {
        // Long repeats push ranges past the depth threshold
        let mut block = b"the quick brown fox ".repeat(40);
        block.extend_from_slice(b"jumps");
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        let mut offsets: Vec<u32> = (0..block.len() as u32).collect();
        multikey_quick_sort(&mut offsets, &stripe, 0);
        assert_sorted(&block, &offsets);
    }

    /// Most multi-key frames a range of `n` can need.
    fn multikey_frame_bound(n: usize) -> usize {
        fn above(n: usize) -> usize {
            if n <= SMALL_THRESHOLD {
                return 0;
            }
            3usize.max(2 + above(n / 3)).max(1 + above(n / 2))
        }
        above(n).max(1)
    }

    /// Most quicksort frames a range of `n` can need.
    fn quick_frame_bound(n: usize) -> usize {
        let mut frames = 0usize;
        let mut n = n;
        while n >= INSERTION_THRESHOLD {
            frames = if frames == 0 { 2 } else { frames + 1 };
            n /= 2;
        }
        frames.max(1)
    }

    #[test]
    fn test_stack_frames_cover_max_block() {
        assert_eq!(multikey_frame_bound(crate::MAX_BLOCK_SIZE), 27);
        assert_eq!(quick_frame_bound(crate::MAX_BLOCK_SIZE), 23);
        assert!(multikey_frame_bound(crate::MAX_BLOCK_SIZE) <= MULTIKEY_STACK_FRAMES);
        assert!(quick_frame_bound(crate::MAX_BLOCK_SIZE) <= QUICKSORT_STACK_FRAMES);
    }

    #[test]
    fn test_stack_peaks_on_hard_ranges() {
        let mut unit = random_block(64, b"acgt", 3);
        unit.extend_from_slice(b"tail");
        let repeats = unit.repeat(40);
        let cases: Vec<(&str, Vec<u8>)> = vec![
            ("periodic", b"ab".repeat(2000)),
            ("long repeats", repeats),
            ("random", random_block(100_000, b"acgt", 9)),
            ("runs", {
                let mut block = vec![b'a'; 20_000];
                for i in (0..block.len()).step_by(1000) {
                    block[i] = b'b';
                }
                block
            }),
        ];

        for (name, block) in cases {
            let n = block.len();
            let mut stripe = Stripe::with_capacity(n);
            stripe.build(&block);

            let mut offsets: Vec<u32> = (0..n as u32).collect();
            let peak = multikey_frames(&mut offsets, &stripe, 0);
            assert_sorted(&block, &offsets);
            assert!(
                peak.multikey <= multikey_frame_bound(n),
                "{name}: multi-key stack reached {}",
                peak.multikey
            );
            assert!(
                peak.quick <= quick_frame_bound(n),
                "{name}: quicksort stack reached {}",
                peak.quick
            );

            let mut offsets: Vec<u32> = (0..n as u32).collect();
            let frames = quick_sort_frames(&mut offsets, &stripe, 0);
            assert_sorted(&block, &offsets);
            assert!(frames <= quick_frame_bound(n), "{name}: quicksort stack reached {frames}");
        }
    }

    #[test]
    fn test_multikey_periodic_block() {
        let block = b"xy".repeat(100);
        let mut stripe = Stripe::with_capacity(block.len());
        stripe.build(&block);

        let mut offsets: Vec<u32> = (0..block.len() as u32).collect();
        multikey_quick_sort(&mut offsets, &stripe, 0);
        assert_sorted(&block, &offsets);

        let mut seen = offsets.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<u32>>());
    }
}
