//! Burrows-Wheeler Transform.
//!
//! The forward direction sorts every rotation with [`BlockSorter`] and keeps
//! the last byte of each sorted rotation. The inverse is a linear pass that
//! links every row to the row of the rotation starting one byte later.

use crate::block_sort::BlockSorter;
use oxibsc_core::error::{BscError, Result};

/// Write the last column of the sorted rotation matrix into `out`.
pub fn last_column(block: &[u8], rotation_index: &[u32], out: &mut Vec<u8>) {
    let n = block.len();
    out.clear();
    out.extend(rotation_index.iter().map(|&p| {
        let p = p as usize;
        block[if p == 0 { n - 1 } else { p - 1 }]
    }));
}

/// Perform the forward transform of `block` into `out`.
///
/// Returns the origin row needed to undo the transform.
pub fn transform(sorter: &mut BlockSorter, block: &[u8], out: &mut Vec<u8>) -> u32 {
    let origin = sorter.sort(block);
    last_column(block, sorter.rotation_index(), out);
    origin
}

/// Rebuild the original block from its last column.
///
/// `successor` is scratch space reused across calls. `out` must be exactly as
/// long as `last`.
pub fn undo_transform(
    last: &[u8],
    origin: u32,
    successor: &mut Vec<u32>,
    out: &mut [u8],
) -> Result<()> {
    let n = last.len();
    debug_assert_eq!(out.len(), n);
    if origin as usize >= n {
        return Err(BscError::invalid_origin(origin, n));
    }

    let mut count = [0u32; 256];
    for &c in last {
        count[c as usize] += 1;
    }

    let mut cum = [0u32; 256];
    let mut sum = 0;
    for (slot, &c) in cum.iter_mut().zip(count.iter()) {
        *slot = sum;
        sum += c;
    }

    successor.clear();
    successor.resize(n, 0);
    for (i, &c) in last.iter().enumerate() {
        let slot = &mut cum[c as usize];
        successor[*slot as usize] = i as u32;
        *slot += 1;
    }

    let mut j = origin as usize;
    for byte in out.iter_mut() {
        *byte = last[j];
        j = successor[j] as usize;
    }
    Ok(())
}

/// Convenience inverse transform into a fresh buffer.
pub fn inverse_transform(last: &[u8], origin: u32) -> Result<Vec<u8>> {
    let mut out = vec![0u8; last.len()];
    let mut successor = Vec::with_capacity(last.len());
    undo_transform(last, origin, &mut successor, &mut out)?;
    Ok(out)
}
