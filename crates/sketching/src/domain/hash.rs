//! Hash function implementations
//!
//! This module defines the hashing seams used by every sketch and the default
//! FNV-1a based hasher.

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Offset basis for fingerprints, so they are independent from bucket indices
const FINGERPRINT_OFFSET_BASIS: u64 = 0x84222325cbf29ce4;

/// Maps byte strings to hash values
///
/// Implementors only provide a 64-bit digest; the multi-hash derivation used
/// by Bloom filters, MinHash and Count-Min comes for free.
pub trait Hashing: Clone + Send + Sync {
    /// Hash an arbitrary byte string to 64 bits
    fn hash64(value: &[u8]) -> u64;

    /// Derive `count` hash values in `[0, upper_bound)` from one digest
    ///
    /// Double hashing over the two 32-bit halves `a` and `b` of the digest:
    /// `h_i = (a + i * b) mod upper_bound` for `i = 1..=count`.
    ///
    /// # Panics
    ///
    /// Panics if `upper_bound` is zero.
    fn hashes(value: &[u8], upper_bound: u32, count: usize) -> Vec<u32> {
        assert!(upper_bound > 0, "upper_bound must be > 0");

        let digest = Self::hash64(value);
        let a = digest & 0xFFFF_FFFF;
        let b = digest >> 32;
        let upper = upper_bound as u64;

        (1..=count as u64)
            .map(|i| (a.wrapping_add(i.wrapping_mul(b)) % upper) as u32)
            .collect()
    }
}

/// Produces short fixed-size fingerprints of byte strings
pub trait Fingerprinting {
    /// Maximum size, in bytes, of a fingerprint
    const FINGERPRINT_SIZE: usize;

    /// Fingerprint of `value`, `FINGERPRINT_SIZE` bytes long
    fn fingerprint(value: &[u8]) -> Vec<u8>;
}

/// FNV-1a with a SplitMix64 finalizer
///
/// Plain FNV-1a mixes the last input bytes poorly into the high bits; the
/// finalizer spreads every input bit over the whole digest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fnv1a;

impl Hashing for Fnv1a {
    #[inline]
    fn hash64(value: &[u8]) -> u64 {
        mix64(fnv1a64(value, FNV_OFFSET_BASIS))
    }
}

impl Fingerprinting for Fnv1a {
    const FINGERPRINT_SIZE: usize = 4;

    fn fingerprint(value: &[u8]) -> Vec<u8> {
        let digest = mix64(fnv1a64(value, FINGERPRINT_OFFSET_BASIS));
        digest.to_le_bytes()[..Self::FINGERPRINT_SIZE].to_vec()
    }
}

/// Raw 64-bit FNV-1a
#[inline]
pub fn fnv1a64(value: &[u8], offset_basis: u64) -> u64 {
    let mut h = offset_basis;
    for &byte in value {
        h ^= byte as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// SplitMix64 finalizer
///
/// Each bit of the input affects approximately half of the output bits.
#[inline]
pub fn mix64(mut h: u64) -> u64 {
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d049bb133111eb);
    h ^ (h >> 31)
}
