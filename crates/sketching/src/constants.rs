//! Sketch related constants
//!
//! Note: FNV/SplitMix parameters are defined in domain/hash.rs since only the hasher uses them.

// =============================================================================
// Bit storage
// =============================================================================

/// Number of bits per storage word
pub const WORD_BITS: usize = u64::BITS as usize;

// =============================================================================
// HyperLogLog parameters
// =============================================================================

/// Smallest supported precision (2^4 = 16 registers)
pub const MIN_PRECISION: u8 = 4;

/// Largest supported precision (2^16 = 65,536 registers)
pub const MAX_PRECISION: u8 = 16;

/// Default precision (2^8 = 256 registers, ~6.5% standard error)
pub const DEFAULT_PRECISION: u8 = 8;

// =============================================================================
// Cuckoo filter parameters
// =============================================================================

/// Fingerprints per bucket
pub const DEFAULT_BUCKET_SIZE: usize = 4;

/// Bytes per fingerprint
pub const DEFAULT_FINGERPRINT_SIZE: usize = 1;

/// Maximum number of relocations attempted by a single insert
pub const DEFAULT_EVICTIONS_LIMIT: usize = 500;

// =============================================================================
// File format
// =============================================================================

/// Magic bytes at the start of every sketch file
pub const SKETCH_MAGIC: [u8; 8] = *b"SKETCH\0\0";

/// Current sketch file format version
pub const FILE_FORMAT_VERSION: u16 = 1;

/// Byte size of the sketch file header
pub const FILE_HEADER_SIZE: usize = 64;

/// Sketch file extension
pub const SKETCH_FILE_EXTENSION: &str = "sketch";

// =============================================================================
// Command-line defaults
// =============================================================================

/// Bloom filter false positive rate when no size is given
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

/// MinHash signature length
pub const DEFAULT_MIN_HASH_COUNT: usize = 128;

/// Count-Min relative error bound
pub const DEFAULT_EPSILON: f64 = 0.001;

/// Count-Min confidence
pub const DEFAULT_CONFIDENCE: f64 = 0.99;
