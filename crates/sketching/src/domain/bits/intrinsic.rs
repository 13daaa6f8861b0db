//! Hardware-backed bit primitives
//!
//! Compiles to POPCNT / TZCNT (or the target's equivalent) when the target
//! supports them. Used when the `intrinsics` feature is enabled.

/// Number of set bits in `x` (0-64)
#[inline(always)]
pub fn popcount(x: u64) -> u32 {
    x.count_ones()
}

/// One plus the index of the lowest set bit, or 0 when `x == 0`
#[inline(always)]
pub fn find_first_set(x: u64) -> u32 {
    if x == 0 { 0 } else { x.trailing_zeros() + 1 }
}
