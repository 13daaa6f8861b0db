//! Fixed-width bit set
//!
//! Bits are packed into `u64` words, lowest index in the lowest bit of the
//! first word. Bits above `bit_width` in the last word are always clear.

use crate::constants::WORD_BITS;
use crate::domain::bits::{find_first_set, popcount};
use crate::domain::error::SketchError;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Fixed-width set of bits
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// Number of addressable bits
    bit_width: usize,
    /// Packed bits, `ceil(bit_width / 64)` words
    words: Vec<u64>,
}

impl BitSet {
    /// Create a bit set with `bit_width` clear bits
    pub fn new(bit_width: usize) -> Result<Self, SketchError> {
        if bit_width == 0 {
            return Err(SketchError::invalid("bit_width", "must be > 0"));
        }

        Ok(Self {
            bit_width,
            words: vec![0; bit_width.div_ceil(WORD_BITS)],
        })
    }

    /// Rebuild a bit set from its packed words (used by deserialization)
    pub fn from_words(bit_width: usize, words: Vec<u64>) -> Result<Self, SketchError> {
        if bit_width == 0 {
            return Err(SketchError::invalid("bit_width", "must be > 0"));
        }
        let expected = bit_width.div_ceil(WORD_BITS);
        if words.len() != expected {
            return Err(SketchError::invalid(
                "words",
                format!("expected {} words, found {}", expected, words.len()),
            ));
        }

        let mut set = Self { bit_width, words };
        set.clear_tail();
        Ok(set)
    }

    /// Number of addressable bits
    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    /// Packed words backing the set
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Read the bit at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= bit_width`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.check_index(index);
        self.words[index / WORD_BITS] >> (index % WORD_BITS) & 1 == 1
    }

    /// Write the bit at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= bit_width`.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        self.check_index(index);
        let mask = 1u64 << (index % WORD_BITS);
        let word = &mut self.words[index / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Bitwise AND with `other`, in place
    pub fn form_conjunction(&mut self, other: &BitSet) -> Result<(), SketchError> {
        self.check_width(other)?;
        for (word, &rhs) in self.words.iter_mut().zip(&other.words) {
            *word &= rhs;
        }
        Ok(())
    }

    /// Bitwise OR with `other`, in place
    pub fn form_disjunction(&mut self, other: &BitSet) -> Result<(), SketchError> {
        self.check_width(other)?;
        for (word, &rhs) in self.words.iter_mut().zip(&other.words) {
            *word |= rhs;
        }
        Ok(())
    }

    /// Invert every bit
    pub fn negate(&mut self) {
        for word in self.words.iter_mut() {
            *word = !*word;
        }
        self.clear_tail();
    }

    /// Number of set bits
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|&w| popcount(w) as usize).sum()
    }

    /// Index of the lowest set bit, `None` when no bit is set
    pub fn first(&self) -> Option<usize> {
        self.words.iter().enumerate().find_map(|(i, &w)| match find_first_set(w) {
            0 => None,
            ffs => Some(i * WORD_BITS + ffs as usize - 1),
        })
    }

    /// Indices of the set bits, ascending
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            let mut rest = w;
            std::iter::from_fn(move || {
                let ffs = find_first_set(rest);
                if ffs == 0 {
                    return None;
                }
                rest &= rest - 1;
                Some(i * WORD_BITS + ffs as usize - 1)
            })
        })
    }

    /// Clear every bit
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    // -------------------------------------------------------------------------
    // Internal methods
    // -------------------------------------------------------------------------

    fn check_index(&self, index: usize) {
        assert!(
            index < self.bit_width,
            "bit index out of range: the width is {} but the index is {}",
            self.bit_width,
            index
        );
    }

    fn check_width(&self, other: &BitSet) -> Result<(), SketchError> {
        if self.bit_width != other.bit_width {
            return Err(SketchError::WidthMismatch {
                expected: self.bit_width,
                found: other.bit_width,
            });
        }
        Ok(())
    }

    fn clear_tail(&mut self) {
        let used = self.bit_width % WORD_BITS;
        if used != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << used) - 1;
        }
    }
}

// =============================================================================
// Operators
// =============================================================================
//
// The operators panic on width mismatch; use `form_conjunction` /
// `form_disjunction` for the fallible versions.

impl BitAnd for &BitSet {
    type Output = BitSet;

    /// # Panics
    ///
    /// Panics if the widths differ.
    fn bitand(self, rhs: &BitSet) -> BitSet {
        let mut conjunction = self.clone();
        conjunction &= rhs;
        conjunction
    }
}

impl BitAndAssign<&BitSet> for BitSet {
    fn bitand_assign(&mut self, rhs: &BitSet) {
        if let Err(e) = self.form_conjunction(rhs) {
            panic!("{}", e);
        }
    }
}

impl BitOr for &BitSet {
    type Output = BitSet;

    /// # Panics
    ///
    /// Panics if the widths differ.
    fn bitor(self, rhs: &BitSet) -> BitSet {
        let mut disjunction = self.clone();
        disjunction |= rhs;
        disjunction
    }
}

impl BitOrAssign<&BitSet> for BitSet {
    fn bitor_assign(&mut self, rhs: &BitSet) {
        if let Err(e) = self.form_disjunction(rhs) {
            panic!("{}", e);
        }
    }
}

impl Not for &BitSet {
    type Output = BitSet;

    fn not(self) -> BitSet {
        let mut negation = self.clone();
        negation.negate();
        negation
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits: String = self
            .words
            .iter()
            .rev()
            .map(|w| format!("{:064b}", w))
            .collect();
        let value = digits.trim_start_matches('0');
        write!(f, "BitSet (width={}, value={})", self.bit_width, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_bits(width: usize, bits: &[usize]) -> BitSet {
        let mut set = BitSet::new(width).unwrap();
        for &b in bits {
            set.set(b, true);
        }
        set
    }

    #[test]
    fn test_new_rejects_zero_width() {
        assert!(matches!(
            BitSet::new(0),
            Err(SketchError::InvalidParameter { name: "bit_width", .. })
        ));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(BitSet::new(1).unwrap().words().len(), 1);
        assert_eq!(BitSet::new(64).unwrap().words().len(), 1);
        assert_eq!(BitSet::new(65).unwrap().words().len(), 2);
        assert_eq!(BitSet::new(512).unwrap().words().len(), 8);
    }

    #[test]
    fn test_set_and_clear() {
        let mut set = BitSet::new(130).unwrap();
        for i in [0, 63, 64, 129] {
            set.set(i, true);
            assert!(set.get(i));
        }
        assert_eq!(set.cardinality(), 4);

        set.set(64, false);
        assert!(!set.get(64));
        assert_eq!(set.cardinality(), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range_panics() {
        BitSet::new(50).unwrap().get(50);
    }

    #[test]
    fn test_conjunction() {
        let set = with_bits(128, &[0, 2, 64]);
        let other = with_bits(128, &[1]);

        let mut a = set.clone();
        a.form_conjunction(&set).unwrap();
        assert_eq!(a, set);

        a.form_conjunction(&other).unwrap();
        assert_eq!(a, BitSet::new(128).unwrap());

        let mut b = set.clone();
        b.form_conjunction(&with_bits(128, &[1, 2])).unwrap();
        assert_eq!(b.cardinality(), 1);
        assert!(b.get(2));
    }

    #[test]
    fn test_disjunction() {
        let mut a = with_bits(50, &[0, 2]);
        a.form_disjunction(&with_bits(50, &[1])).unwrap();
        assert_eq!(a, with_bits(50, &[0, 1, 2]));
    }

    #[test]
    fn test_width_mismatch() {
        let mut a = BitSet::new(50).unwrap();
        let b = BitSet::new(51).unwrap();
        assert_eq!(
            a.form_disjunction(&b),
            Err(SketchError::WidthMismatch {
                expected: 50,
                found: 51
            })
        );
        assert!(a.form_conjunction(&b).is_err());
    }

    #[test]
    fn test_operators() {
        let set = with_bits(50, &[0, 2]);
        let other = with_bits(50, &[1]);

        assert_eq!(&set & &set, set);
        assert_eq!(&set & &other, BitSet::new(50).unwrap());
        assert_eq!(&set | &other, with_bits(50, &[0, 1, 2]));

        let mut c = set.clone();
        c |= &other;
        c &= &other;
        assert_eq!(c, other);
    }

    #[test]
    #[should_panic(expected = "Width mismatch")]
    fn test_operator_width_mismatch_panics() {
        let _ = &BitSet::new(8).unwrap() | &BitSet::new(9).unwrap();
    }

    #[test]
    fn test_negation_keeps_tail_clear() {
        let set = with_bits(50, &[0, 1]);
        let negated = !&set;

        assert!(!negated.get(0));
        assert!(!negated.get(1));
        assert!((2..50).all(|i| negated.get(i)));
        assert_eq!(negated.cardinality(), 48);
        assert_eq!(negated.words()[0] >> 50, 0);

        let full = !&BitSet::new(50).unwrap();
        assert_eq!(full.cardinality(), 50);
    }

    #[test]
    fn test_first() {
        let mut set = BitSet::new(50).unwrap();
        assert_eq!(set.first(), None);

        set.set(0, true);
        assert_eq!(set.first(), Some(0));

        set.set(0, false);
        set.set(49, true);
        assert_eq!(set.first(), Some(49));

        set.set(49, false);
        set.negate();
        assert_eq!(set.first(), Some(0));
    }

    #[test]
    fn test_first_in_later_word() {
        let set = with_bits(300, &[200, 299]);
        assert_eq!(set.first(), Some(200));
    }

    #[test]
    fn test_iter_ones() {
        let bits = [3, 64, 65, 127, 128, 199];
        let set = with_bits(200, &bits);
        assert_eq!(set.iter_ones().collect::<Vec<_>>(), bits);
        assert_eq!(BitSet::new(10).unwrap().iter_ones().count(), 0);
    }

    #[test]
    fn test_from_words_masks_tail() {
        let set = BitSet::from_words(4, vec![u64::MAX]).unwrap();
        assert_eq!(set.cardinality(), 4);
        assert!(BitSet::from_words(65, vec![0]).is_err());
    }

    #[test]
    fn test_display() {
        let set = with_bits(70, &[0, 2, 65]);
        let expected = format!("BitSet (width=70, value=10{}101)", "0".repeat(61));
        assert_eq!(set.to_string(), expected);
        assert_eq!(
            BitSet::new(8).unwrap().to_string(),
            "BitSet (width=8, value=)"
        );
    }
}
