//! HyperLogLog distinct-count estimator
//!
//! `2^precision` one-byte registers; each holds the longest run of leading
//! zeros (plus one) seen among the hashes routed to it.

use crate::constants::{MAX_PRECISION, MIN_PRECISION};
use crate::domain::error::SketchError;
use crate::domain::hash::{Fnv1a, Hashing};
use crate::domain::sketch::Sketch;
use std::marker::PhantomData;

/// HyperLogLog sketch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HyperLogLog<H = Fnv1a> {
    precision: u8,
    registers: Vec<u8>,
    _hasher: PhantomData<fn() -> H>,
}

impl<H: Hashing> HyperLogLog<H> {
    /// Create an empty sketch with `2^precision` registers
    ///
    /// `precision` must be in `4..=16`.
    pub fn new(precision: u8) -> Result<Self, SketchError> {
        check_precision(precision)?;
        Ok(Self {
            precision,
            registers: vec![0; 1 << precision],
            _hasher: PhantomData,
        })
    }

    /// Rebuild a sketch from its registers (used by deserialization)
    pub fn from_registers(precision: u8, registers: Vec<u8>) -> Result<Self, SketchError> {
        check_precision(precision)?;
        if registers.len() != 1 << precision {
            return Err(SketchError::invalid(
                "registers",
                format!(
                    "expected {} registers, found {}",
                    1usize << precision,
                    registers.len()
                ),
            ));
        }
        let max_rank = 64 - precision + 1;
        if let Some(&bad) = registers.iter().find(|&&r| r > max_rank) {
            return Err(SketchError::invalid(
                "registers",
                format!("register value {} exceeds {}", bad, max_rank),
            ));
        }

        Ok(Self {
            precision,
            registers,
            _hasher: PhantomData,
        })
    }

    /// Number of index bits
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Register values
    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Insert an item
    pub fn insert(&mut self, item: &[u8]) {
        let hash = H::hash64(item);
        let index = (hash >> (64 - self.precision)) as usize;
        let rest = hash << self.precision;
        let rank = if rest == 0 {
            64 - self.precision + 1
        } else {
            rest.leading_zeros() as u8 + 1
        };

        let register = &mut self.registers[index];
        *register = (*register).max(rank);
    }

    /// Estimate of the number of distinct items inserted
    pub fn cardinality(&self) -> f64 {
        let m = self.registers.len() as f64;
        let sum: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-(r as i32)))
            .sum();
        let estimate = alpha(self.registers.len()) * m * m / sum;

        if estimate <= 2.5 * m {
            let zeros = self.registers.iter().filter(|&&r| r == 0).count();
            if zeros > 0 {
                // Linear counting for the small range
                return m * (m / zeros as f64).ln();
            }
        }

        estimate
    }

    /// Register-wise max with `other`
    pub fn form_union(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision {
            return Err(SketchError::PrecisionMismatch {
                expected: self.precision,
                found: other.precision,
            });
        }
        for (r, &o) in self.registers.iter_mut().zip(&other.registers) {
            *r = (*r).max(o);
        }
        Ok(())
    }

    /// Union of this sketch and `other`
    pub fn union(&self, other: &Self) -> Result<Self, SketchError> {
        let mut union = self.clone();
        union.form_union(other)?;
        Ok(union)
    }
}

impl<H: Hashing> Sketch for HyperLogLog<H> {
    fn insert(&mut self, item: &[u8]) {
        HyperLogLog::insert(self, item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        self.form_union(other)
    }
}

fn check_precision(precision: u8) -> Result<(), SketchError> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
        return Err(SketchError::invalid(
            "precision",
            format!(
                "must be in {}..={}, got {}",
                MIN_PRECISION, MAX_PRECISION, precision
            ),
        ));
    }
    Ok(())
}

/// Bias correction constant for `m` registers
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}
