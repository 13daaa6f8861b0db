//! Cuckoo filter
//!
//! Approximate set membership that, unlike a Bloom filter, supports removal.
//! Each item is stored as a short fingerprint in one of two candidate
//! buckets; the second bucket is derived from the first and the fingerprint
//! alone (partial-key cuckoo hashing), so stored fingerprints can be relocated
//! without the original item.

use crate::constants::{DEFAULT_BUCKET_SIZE, DEFAULT_EVICTIONS_LIMIT, DEFAULT_FINGERPRINT_SIZE};
use crate::domain::error::SketchError;
use crate::domain::hash::{Fingerprinting, Fnv1a, Hashing};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;

/// Fingerprint that could not be placed after exhausting the evictions limit
#[derive(Clone, Debug)]
struct Victim {
    index: usize,
    fingerprint: Vec<u8>,
}

/// Cuckoo filter
#[derive(Clone, Debug)]
pub struct CuckooFilter<H = Fnv1a> {
    buckets: Vec<Vec<Vec<u8>>>,
    bucket_size: usize,
    fingerprint_size: usize,
    evictions_limit: usize,
    len: usize,
    /// Holds one displaced fingerprint once the table is effectively full
    victim: Option<Victim>,
    rng: StdRng,
    _hasher: PhantomData<fn() -> H>,
}

impl<H: Hashing + Fingerprinting> CuckooFilter<H> {
    /// Create an empty filter with at least `capacity` buckets and default options
    pub fn new(capacity: usize) -> Result<Self, SketchError> {
        Self::with_options(
            capacity,
            DEFAULT_BUCKET_SIZE,
            DEFAULT_FINGERPRINT_SIZE,
            DEFAULT_EVICTIONS_LIMIT,
        )
    }

    /// Create an empty filter
    ///
    /// - `capacity`: minimum number of buckets (rounded up to a power of two)
    /// - `bucket_size`: fingerprints per bucket
    /// - `fingerprint_size`: bytes per fingerprint, `1..=H::FINGERPRINT_SIZE`
    /// - `evictions_limit`: relocations attempted before an insert gives up
    pub fn with_options(
        capacity: usize,
        bucket_size: usize,
        fingerprint_size: usize,
        evictions_limit: usize,
    ) -> Result<Self, SketchError> {
        Self::build(
            capacity,
            bucket_size,
            fingerprint_size,
            evictions_limit,
            StdRng::from_entropy(),
        )
    }

    /// Same as `with_options`, with a fixed seed for the eviction choices
    pub fn with_seed(
        capacity: usize,
        bucket_size: usize,
        fingerprint_size: usize,
        evictions_limit: usize,
        seed: u64,
    ) -> Result<Self, SketchError> {
        Self::build(
            capacity,
            bucket_size,
            fingerprint_size,
            evictions_limit,
            StdRng::seed_from_u64(seed),
        )
    }

    fn build(
        capacity: usize,
        bucket_size: usize,
        fingerprint_size: usize,
        evictions_limit: usize,
        rng: StdRng,
    ) -> Result<Self, SketchError> {
        if capacity == 0 {
            return Err(SketchError::invalid("capacity", "must be > 0"));
        }
        if bucket_size == 0 {
            return Err(SketchError::invalid("bucket_size", "must be > 0"));
        }
        if fingerprint_size == 0 || fingerprint_size > H::FINGERPRINT_SIZE {
            return Err(SketchError::invalid(
                "fingerprint_size",
                format!("must be in 1..={}, got {}", H::FINGERPRINT_SIZE, fingerprint_size),
            ));
        }
        let buckets = capacity
            .checked_next_power_of_two()
            .ok_or_else(|| SketchError::invalid("capacity", "too large"))?;

        Ok(Self {
            buckets: vec![Vec::with_capacity(bucket_size); buckets],
            bucket_size,
            fingerprint_size,
            evictions_limit,
            len: 0,
            victim: None,
            rng,
            _hasher: PhantomData,
        })
    }

    /// Number of buckets
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of items stored
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if no item is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an item
    ///
    /// Returns `false` when the filter is full; the filter is left unchanged.
    pub fn insert(&mut self, item: &[u8]) -> bool {
        if self.victim.is_some() {
            return false;
        }

        let mut fingerprint = self.fingerprint(item);
        let i1 = self.index(item);
        let i2 = self.alternate_index(i1, &fingerprint);

        if self.try_store(i1, &fingerprint) || self.try_store(i2, &fingerprint) {
            self.len += 1;
            return true;
        }

        let mut index = if self.rng.gen_bool(0.5) { i1 } else { i2 };
        for _ in 0..self.evictions_limit {
            let slot = self.rng.gen_range(0..self.buckets[index].len());
            std::mem::swap(&mut fingerprint, &mut self.buckets[index][slot]);
            index = self.alternate_index(index, &fingerprint);
            if self.try_store(index, &fingerprint) {
                self.len += 1;
                return true;
            }
        }

        // Keep the displaced fingerprint so no stored item is lost
        self.victim = Some(Victim { index, fingerprint });
        self.len += 1;
        true
    }

    /// Insert an item unless it is (possibly) already present
    ///
    /// Returns `true` if the item was added or was already present.
    pub fn insert_if_absent(&mut self, item: &[u8]) -> bool {
        self.contains(item) || self.insert(item)
    }

    /// `true` if `item` is possibly in the filter, `false` if it certainly isn't
    pub fn contains(&self, item: &[u8]) -> bool {
        let fingerprint = self.fingerprint(item);
        let i1 = self.index(item);
        let i2 = self.alternate_index(i1, &fingerprint);

        self.buckets[i1].contains(&fingerprint)
            || self.buckets[i2].contains(&fingerprint)
            || self.victim.as_ref().is_some_and(|v| {
                (v.index == i1 || v.index == i2) && v.fingerprint == fingerprint
            })
    }

    /// Remove one occurrence of `item`
    ///
    /// Returns `true` if a matching fingerprint was removed.
    pub fn remove(&mut self, item: &[u8]) -> bool {
        let fingerprint = self.fingerprint(item);
        let i1 = self.index(item);
        let i2 = self.alternate_index(i1, &fingerprint);

        if self.victim.as_ref().is_some_and(|v| {
            (v.index == i1 || v.index == i2) && v.fingerprint == fingerprint
        }) {
            self.victim = None;
            self.len -= 1;
            return true;
        }

        if !(self.try_remove(i1, &fingerprint) || self.try_remove(i2, &fingerprint)) {
            return false;
        }
        self.len -= 1;

        // A slot was freed: give the stashed fingerprint a home again
        if let Some(victim) = self.victim.take() {
            let alternate = self.alternate_index(victim.index, &victim.fingerprint);
            if !(self.try_store(victim.index, &victim.fingerprint)
                || self.try_store(alternate, &victim.fingerprint))
            {
                self.victim = Some(victim);
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Internal methods
    // -------------------------------------------------------------------------

    fn fingerprint(&self, item: &[u8]) -> Vec<u8> {
        let mut fingerprint = H::fingerprint(item);
        fingerprint.truncate(self.fingerprint_size);
        fingerprint
    }

    fn index(&self, item: &[u8]) -> usize {
        H::hash64(item) as usize & (self.buckets.len() - 1)
    }

    /// Involution: `alternate_index(alternate_index(i, f), f) == i`
    fn alternate_index(&self, index: usize, fingerprint: &[u8]) -> usize {
        (index ^ H::hash64(fingerprint) as usize) & (self.buckets.len() - 1)
    }

    fn try_store(&mut self, index: usize, fingerprint: &[u8]) -> bool {
        let bucket = &mut self.buckets[index];
        if bucket.len() >= self.bucket_size {
            return false;
        }
        bucket.push(fingerprint.to_vec());
        true
    }

    fn try_remove(&mut self, index: usize, fingerprint: &[u8]) -> bool {
        let bucket = &mut self.buckets[index];
        match bucket.iter().position(|f| f == fingerprint) {
            Some(slot) => {
                bucket.swap_remove(slot);
                true
            }
            None => false,
        }
    }
}
