//! sketching - Bit primitives and mergeable probabilistic sketches
//!
//! This crate provides functionality to:
//! - Count set bits and locate the lowest set bit of a word (`popcount`,
//!   `find_first_set`), via hardware instructions or a portable fallback
//! - Approximate membership (Bloom and Cuckoo filters), distinct counts
//!   (HyperLogLog), set similarity (MinHash) and frequencies (Count-Min)
//! - Save, load and merge sketches as binary files

pub mod constants;
pub mod domain;
pub mod infra;
pub mod app;

// Re-export commonly used types
pub use constants::*;
pub use domain::bit_set::BitSet;
pub use domain::bits::{find_first_set, popcount};
pub use domain::bloom::BloomFilter;
pub use domain::count_min::CountMin;
pub use domain::cuckoo::CuckooFilter;
pub use domain::error::SketchError;
pub use domain::hash::{Fingerprinting, Fnv1a, Hashing};
pub use domain::hyper_log_log::HyperLogLog;
pub use domain::min_hash::MinHash;
pub use domain::sketch::Sketch;
pub use domain::sketch_format::{SketchFormatError, SketchHeader, SketchKind};
