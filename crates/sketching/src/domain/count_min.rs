//! Count-Min frequency sketch
//!
//! A `depth x width` matrix of counters. Each row maps a key to one column;
//! the estimate is the smallest counter across rows, so it never
//! under-counts.

use crate::domain::error::SketchError;
use crate::domain::hash::{Fnv1a, Hashing};
use crate::domain::sketch::Sketch;
use std::marker::PhantomData;

/// Count-Min sketch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountMin<H = Fnv1a> {
    depth: usize,
    width: usize,
    /// Row-major counters, `depth * width` cells
    counts: Vec<u64>,
    _hasher: PhantomData<fn() -> H>,
}

impl<H: Hashing> CountMin<H> {
    /// Create an empty sketch with `depth` rows and `width` columns
    pub fn new(depth: usize, width: usize) -> Result<Self, SketchError> {
        let cells = check_dimensions(depth, width)?;
        Ok(Self {
            depth,
            width,
            counts: vec![0; cells],
            _hasher: PhantomData,
        })
    }

    /// Create an empty sketch whose estimates are within `epsilon` (relative
    /// to the stream total) with probability `delta`
    pub fn with_error_bounds(epsilon: f64, delta: f64) -> Result<Self, SketchError> {
        let (depth, width) = ideal_parameters(epsilon, delta)?;
        Self::new(depth, width)
    }

    /// Rebuild a sketch from its counters (used by deserialization)
    pub fn from_counts(depth: usize, width: usize, counts: Vec<u64>) -> Result<Self, SketchError> {
        let cells = check_dimensions(depth, width)?;
        if counts.len() != cells {
            return Err(SketchError::invalid(
                "counts",
                format!("expected {} cells, found {}", cells, counts.len()),
            ));
        }
        Ok(Self {
            depth,
            width,
            counts,
            _hasher: PhantomData,
        })
    }

    /// Number of rows
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row-major counters
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Record `value` new occurrences of `key`
    pub fn update(&mut self, key: &[u8], value: u64) {
        for (row, column) in self.columns(key).into_iter().enumerate() {
            let cell = &mut self.counts[row * self.width + column as usize];
            *cell = cell.saturating_add(value);
        }
    }

    /// Estimated number of occurrences of `key`
    pub fn estimate(&self, key: &[u8]) -> u64 {
        self.columns(key)
            .into_iter()
            .enumerate()
            .map(|(row, column)| self.counts[row * self.width + column as usize])
            .min()
            .unwrap_or(0)
    }

    /// Add the counters of `other`
    pub fn form_union(&mut self, other: &Self) -> Result<(), SketchError> {
        if (self.depth, self.width) != (other.depth, other.width) {
            return Err(SketchError::DimensionMismatch {
                expected: (self.depth, self.width),
                found: (other.depth, other.width),
            });
        }
        for (c, &o) in self.counts.iter_mut().zip(&other.counts) {
            *c = c.saturating_add(o);
        }
        Ok(())
    }

    /// Sum of this sketch and `other`
    pub fn union(&self, other: &Self) -> Result<Self, SketchError> {
        let mut union = self.clone();
        union.form_union(other)?;
        Ok(union)
    }

    fn columns(&self, key: &[u8]) -> Vec<u32> {
        H::hashes(key, self.width as u32, self.depth)
    }
}

impl<H: Hashing> Sketch for CountMin<H> {
    fn insert(&mut self, item: &[u8]) {
        self.update(item, 1);
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.form_union(other)
    }
}

/// Number of counters for a `depth x width` matrix
fn check_dimensions(depth: usize, width: usize) -> Result<usize, SketchError> {
    if depth == 0 {
        return Err(SketchError::invalid("depth", "must be > 0"));
    }
    if width == 0 || width > u32::MAX as usize {
        return Err(SketchError::invalid("width", "must be in 1..=u32::MAX"));
    }
    depth.checked_mul(width).ok_or_else(|| {
        SketchError::invalid("depth", format!("{} x {} counters overflow", depth, width))
    })
}

/// `(depth, width)` for relative accuracy `epsilon` with confidence `delta`
///
/// `depth = ceil(ln(1 - delta) / ln(0.5))`, `width = ceil(2 / epsilon)`.
pub fn ideal_parameters(epsilon: f64, delta: f64) -> Result<(usize, usize), SketchError> {
    if !(epsilon > 0.0 && epsilon < 1.0) {
        return Err(SketchError::invalid(
            "epsilon",
            format!("must be in (0, 1), got {}", epsilon),
        ));
    }
    if !(delta > 0.0 && delta < 1.0) {
        return Err(SketchError::invalid(
            "delta",
            format!("must be in (0, 1), got {}", delta),
        ));
    }

    let depth = (1.0 - delta).ln() / 0.5f64.ln();
    let width = 2.0 / epsilon;
    Ok((depth.ceil() as usize, width.ceil() as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sketch() -> CountMin<Fnv1a> {
        CountMin::with_error_bounds(0.01, 0.99).unwrap()
    }

    #[test]
    fn test_ideal_parameters() {
        // log2(100) ≈ 6.64 rows, 2 / 0.01 = 200 columns
        assert_eq!(ideal_parameters(0.01, 0.99).unwrap(), (7, 200));
        assert!(ideal_parameters(0.0, 0.5).is_err());
        assert!(ideal_parameters(0.5, 1.0).is_err());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(CountMin::<Fnv1a>::new(0, 10).is_err());
        assert!(CountMin::<Fnv1a>::new(3, 0).is_err());
    }

    #[test]
    fn test_dimension_overflow() {
        let depth = usize::MAX / 2 + 1;
        assert!(matches!(
            CountMin::<Fnv1a>::new(depth, 2),
            Err(SketchError::InvalidParameter { name: "depth", .. })
        ));
        assert!(matches!(
            CountMin::<Fnv1a>::from_counts(depth, 2, Vec::new()),
            Err(SketchError::InvalidParameter { name: "depth", .. })
        ));
    }

    #[test]
    fn test_update() {
        let mut c = sketch();
        c.update(b"a", 100);
        c.update(b"b", 50);
        c.update(b"c", 1032950);
        c.update(b"b", 100);
        c.update(b"d", 10);

        assert_eq!(c.estimate(b"a"), 100);
        assert_eq!(c.estimate(b"b"), 150);
        assert_eq!(c.estimate(b"c"), 1032950);
        assert_eq!(c.estimate(b"d"), 10);
    }

    #[test]
    fn test_estimate_absent_key() {
        let mut c = sketch();
        c.update(b"a", 100);
        c.update(b"b", 50);

        assert_eq!(c.estimate(b"a"), 100);
        assert_eq!(c.estimate(b"b"), 50);
        assert_eq!(c.estimate(b"c"), 0);
    }

    #[test]
    fn test_never_under_estimates() {
        let mut c = CountMin::<Fnv1a>::new(4, 32).unwrap();
        for i in 0u32..500 {
            c.update(&i.to_le_bytes(), (i % 7 + 1) as u64);
        }
        for i in 0u32..500 {
            assert!(c.estimate(&i.to_le_bytes()) >= (i % 7 + 1) as u64);
        }
    }

    #[test]
    fn test_union() {
        let mut a = sketch();
        a.update(b"a", 100);
        a.update(b"b", 50);

        let mut b = sketch();
        b.update(b"a", 10);
        b.update(b"b", 20);

        let c = a.union(&b).unwrap();
        assert_eq!(c.estimate(b"a"), 110);
        assert_eq!(c.estimate(b"b"), 70);
    }

    #[test]
    fn test_union_dimension_mismatch() {
        let mut a = CountMin::<Fnv1a>::new(3, 10).unwrap();
        let b = CountMin::<Fnv1a>::new(3, 11).unwrap();
        assert_eq!(
            a.form_union(&b),
            Err(SketchError::DimensionMismatch {
                expected: (3, 10),
                found: (3, 11)
            })
        );
    }

    #[test]
    fn test_saturating_counts() {
        let mut c = CountMin::<Fnv1a>::new(2, 4).unwrap();
        c.update(b"x", u64::MAX);
        c.update(b"x", 5);
        assert_eq!(c.estimate(b"x"), u64::MAX);
    }
}
