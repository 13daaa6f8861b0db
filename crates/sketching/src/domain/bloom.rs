//! Bloom filter
//!
//! Approximate set membership over a `BitSet`: no false negatives, a tunable
//! rate of false positives.

use crate::domain::bit_set::BitSet;
use crate::domain::error::SketchError;
use crate::domain::hash::{Fnv1a, Hashing};
use crate::domain::sketch::Sketch;
use std::f64::consts::LN_2;
use std::marker::PhantomData;

/// Bloom filter with `hash_count` hash functions over `bit_width` bits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter<H = Fnv1a> {
    hash_count: usize,
    bits: BitSet,
    _hasher: PhantomData<fn() -> H>,
}

impl<H: Hashing> BloomFilter<H> {
    /// Create an empty filter
    pub fn new(bit_width: usize, hash_count: usize) -> Result<Self, SketchError> {
        if hash_count == 0 {
            return Err(SketchError::invalid("hash_count", "must be > 0"));
        }
        check_bit_width(bit_width)?;

        Self::from_parts(BitSet::new(bit_width)?, hash_count)
    }

    /// Create an empty filter sized for `expected_cardinality` items and a
    /// false positive probability of `p`
    pub fn with_false_positive_rate(
        expected_cardinality: usize,
        p: f64,
    ) -> Result<Self, SketchError> {
        let (bit_width, hash_count) = ideal_parameters(expected_cardinality, p)?;
        Self::new(bit_width, hash_count)
    }

    /// Rebuild a filter from its bits (used by deserialization)
    pub fn from_parts(bits: BitSet, hash_count: usize) -> Result<Self, SketchError> {
        if hash_count == 0 {
            return Err(SketchError::invalid("hash_count", "must be > 0"));
        }
        check_bit_width(bits.bit_width())?;

        Ok(Self {
            hash_count,
            bits,
            _hasher: PhantomData,
        })
    }

    /// Number of hash functions
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Number of bits
    pub fn bit_width(&self) -> usize {
        self.bits.bit_width()
    }

    /// Underlying bits
    pub fn bits(&self) -> &BitSet {
        &self.bits
    }

    /// Insert an item
    pub fn insert(&mut self, item: &[u8]) {
        for index in H::hashes(item, self.bits.bit_width() as u32, self.hash_count) {
            self.bits.set(index as usize, true);
        }
    }

    /// `true` if `item` is possibly in the filter, `false` if it certainly isn't
    pub fn contains(&self, item: &[u8]) -> bool {
        H::hashes(item, self.bits.bit_width() as u32, self.hash_count)
            .into_iter()
            .all(|index| self.bits.get(index as usize))
    }

    /// Estimate of the number of distinct items inserted
    ///
    /// `-(m / k) * ln(1 - X / m)` with `X` set bits. Infinite once every bit is set.
    pub fn cardinality(&self) -> f64 {
        let m = self.bits.bit_width() as f64;
        let k = self.hash_count as f64;
        let x = self.bits.cardinality() as f64;
        if x >= m {
            return f64::INFINITY;
        }
        -(m / k) * (1.0 - x / m).ln()
    }

    /// Probability that `contains` reports an item that was never inserted
    ///
    /// `cardinality` is the number of inserted items, or `None` to use the estimate.
    pub fn false_positive_probability(&self, cardinality: Option<usize>) -> f64 {
        let m = self.bits.bit_width() as f64;
        let k = self.hash_count as f64;
        let n = cardinality.map_or_else(|| self.cardinality(), |n| n as f64);
        (1.0 - (-k * n / m).exp()).powf(k)
    }

    /// Add every item of `other` to this filter
    pub fn form_union(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;
        self.bits.form_disjunction(&other.bits)
    }

    /// Keep only the bits also set in `other`
    pub fn form_intersection(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;
        self.bits.form_conjunction(&other.bits)
    }

    /// Union of this filter and `other`
    pub fn union(&self, other: &Self) -> Result<Self, SketchError> {
        let mut union = self.clone();
        union.form_union(other)?;
        Ok(union)
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.hash_count != other.hash_count {
            return Err(SketchError::HashCountMismatch {
                expected: self.hash_count,
                found: other.hash_count,
            });
        }
        Ok(())
    }
}

impl<H: Hashing> Sketch for BloomFilter<H> {
    fn insert(&mut self, item: &[u8]) {
        BloomFilter::insert(self, item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.form_union(other)
    }
}

/// Hash indexes are 32-bit
fn check_bit_width(bit_width: usize) -> Result<(), SketchError> {
    if bit_width > u32::MAX as usize {
        return Err(SketchError::invalid("bit_width", "must fit in 32 bits"));
    }
    Ok(())
}

/// `(bit_width, hash_count)` for `expected_cardinality` items at false positive rate `p`
///
/// `m = ceil(-n ln p / (ln 2)^2)`, `k = ceil(m / n * ln 2)`.
pub fn ideal_parameters(expected_cardinality: usize, p: f64) -> Result<(usize, usize), SketchError> {
    if expected_cardinality == 0 {
        return Err(SketchError::invalid("expected_cardinality", "must be > 0"));
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(SketchError::invalid(
            "probability",
            format!("must be in (0, 1), got {}", p),
        ));
    }

    let n = expected_cardinality as f64;
    let m = -n * p.ln() / (LN_2 * LN_2);
    let k = m / n * LN_2;
    Ok((m.ceil() as usize, k.ceil() as usize))
}
