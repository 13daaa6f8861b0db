//! Bit primitives over 64-bit words
//!
//! `popcount` and `find_first_set` are the two primitives every sketch in this
//! crate is built on. Both are total, pure functions.
//!
//! ## Feature Flags
//!
//! - `intrinsics`: Use the compiler's hardware instructions (POPCNT / TZCNT)
//! - Default without it: Use the portable bit loops (any target)

// =============================================================================
// Implementation selection based on feature flags
// =============================================================================

#[cfg(feature = "intrinsics")]
mod intrinsic;

pub mod portable;

#[cfg(feature = "intrinsics")]
pub use intrinsic::{find_first_set, popcount};

#[cfg(not(feature = "intrinsics"))]
pub use portable::{find_first_set, popcount};

// =============================================================================
// Tests that apply to both implementations
// =============================================================================
