//! Sketch construction and merge errors

use thiserror::Error;

/// Errors raised when building or combining sketches
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchError {
    /// A constructor argument is outside its valid range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    /// Bit sets (or bit-set backed sketches) have different widths
    #[error("Width mismatch: expected {expected}, found {found}")]
    WidthMismatch { expected: usize, found: usize },
    /// Sketches were built with a different number of hash functions
    #[error("Hash count mismatch: expected {expected}, found {found}")]
    HashCountMismatch { expected: usize, found: usize },
    /// HyperLogLog sketches use a different number of registers
    #[error("Precision mismatch: expected {expected}, found {found}")]
    PrecisionMismatch { expected: u8, found: u8 },
    /// Count-Min sketches have different matrix dimensions
    #[error("Dimension mismatch: expected {expected:?} (depth, width), found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl SketchError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = SketchError::WidthMismatch {
            expected: 64,
            found: 128,
        };
        assert_eq!(e.to_string(), "Width mismatch: expected 64, found 128");

        let e = SketchError::invalid("precision", "must be in 4..=16");
        assert_eq!(
            e.to_string(),
            "Invalid parameter precision: must be in 4..=16"
        );
    }
}
