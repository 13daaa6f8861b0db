//! MinHash signatures for Jaccard similarity

use crate::domain::error::SketchError;
use crate::domain::hash::{Fnv1a, Hashing};
use crate::domain::sketch::Sketch;
use std::marker::PhantomData;

/// MinHash signature of `hash_count` slots
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinHash<H = Fnv1a> {
    signature: Vec<u32>,
    _hasher: PhantomData<fn() -> H>,
}

impl<H: Hashing> MinHash<H> {
    /// Create an empty signature
    pub fn new(hash_count: usize) -> Result<Self, SketchError> {
        if hash_count == 0 {
            return Err(SketchError::invalid("hash_count", "must be > 0"));
        }
        Ok(Self::from_signature_unchecked(vec![u32::MAX; hash_count]))
    }

    /// Rebuild a signature from its slots (used by deserialization)
    pub fn from_signature(signature: Vec<u32>) -> Result<Self, SketchError> {
        if signature.is_empty() {
            return Err(SketchError::invalid("hash_count", "must be > 0"));
        }
        Ok(Self::from_signature_unchecked(signature))
    }

    fn from_signature_unchecked(signature: Vec<u32>) -> Self {
        Self {
            signature,
            _hasher: PhantomData,
        }
    }

    /// Number of hash functions (signature slots)
    pub fn hash_count(&self) -> usize {
        self.signature.len()
    }

    /// Signature slots
    pub fn signature(&self) -> &[u32] {
        &self.signature
    }

    /// Insert an item
    pub fn insert(&mut self, item: &[u8]) {
        let hashes = H::hashes(item, u32::MAX, self.signature.len());
        for (slot, hash) in self.signature.iter_mut().zip(hashes) {
            if hash < *slot {
                *slot = hash;
            }
        }
    }

    /// Slot-wise minimum with `other`
    pub fn form_union(&mut self, other: &Self) -> Result<(), SketchError> {
        self.check_compatible(other)?;
        for (slot, &o) in self.signature.iter_mut().zip(&other.signature) {
            *slot = (*slot).min(o);
        }
        Ok(())
    }

    /// Union of this signature and `other`
    pub fn union(&self, other: &Self) -> Result<Self, SketchError> {
        let mut union = self.clone();
        union.form_union(other)?;
        Ok(union)
    }

    /// Estimate of the Jaccard similarity of the two underlying sets
    ///
    /// Fraction of slots holding the same minimum.
    pub fn jaccard(&self, other: &Self) -> Result<f64, SketchError> {
        self.check_compatible(other)?;
        let matching = self
            .signature
            .iter()
            .zip(&other.signature)
            .filter(|(a, b)| a == b)
            .count();
        Ok(matching as f64 / self.signature.len() as f64)
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.signature.len() != other.signature.len() {
            return Err(SketchError::HashCountMismatch {
                expected: self.signature.len(),
                found: other.signature.len(),
            });
        }
        Ok(())
    }
}

impl<H: Hashing> Sketch for MinHash<H> {
    fn insert(&mut self, item: &[u8]) {
        MinHash::insert(self, item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.form_union(other)
    }
}
