//! Common interface of mergeable sketches

use crate::domain::error::SketchError;

/// A summary that absorbs items one at a time and merges with compatible summaries
///
/// Merging two sketches built from item sets `A` and `B` gives the sketch of
/// `A ∪ B` (or, for Count-Min, of the concatenated streams). That is what lets
/// the builder split work across threads.
pub trait Sketch: Clone + Send {
    /// Absorb one item
    fn insert(&mut self, item: &[u8]);

    /// Absorb every item of `other`
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;
}
