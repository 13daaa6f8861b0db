//! Portable bit primitives
//!
//! Plain bit loops with no dependency on target instructions.
//! Used as fallback when the `intrinsics` feature is not enabled, and always
//! exported so both paths can be compared.

/// Number of set bits in `x` (0-64)
///
/// Clears the lowest set bit until nothing is left: one iteration per set bit.
#[inline]
pub fn popcount(mut x: u64) -> u32 {
    let mut count = 0;
    while x != 0 {
        x &= x - 1;
        count += 1;
    }
    count
}

/// One plus the index of the lowest set bit, or 0 when `x == 0`
///
/// Shifts right until the lowest bit is set: one iteration per trailing zero.
#[inline]
pub fn find_first_set(mut x: u64) -> u32 {
    if x == 0 {
        return 0;
    }

    let mut position = 1;
    while x & 1 == 0 {
        x >>= 1;
        position += 1;
    }
    position
}
