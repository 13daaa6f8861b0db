//! Sketch building workflow
//!
//! This module feeds item streams into sketches, optionally across threads.

use crate::domain::error::SketchError;
use crate::domain::sketch::Sketch;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Items between two progress reports
const PROGRESS_INTERVAL: usize = 10_000;

/// Insert every item into a copy of `template`
pub fn build_sketch<S, I, T>(template: &S, items: I) -> S
where
    S: Sketch,
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut sketch = template.clone();
    for item in items {
        sketch.insert(item.as_ref());
    }
    sketch
}

/// Build with progress callback
pub fn build_sketch_with_progress<S, T, F>(template: &S, items: &[T], mut on_progress: F) -> S
where
    S: Sketch,
    T: AsRef<[u8]>,
    F: FnMut(usize, usize), // (current, total)
{
    let total = items.len();
    let mut sketch = template.clone();

    for (i, item) in items.iter().enumerate() {
        sketch.insert(item.as_ref());

        if i % PROGRESS_INTERVAL == 0 {
            on_progress(i, total);
        }
    }

    on_progress(total, total);
    sketch
}

/// Build a sketch using all available cores
///
/// Each rayon worker fills its own copy of `template`; the partial sketches
/// are then merged pairwise. The result equals `build_sketch` for every
/// sketch whose merge is exact (all sketches in this crate).
#[cfg(feature = "parallel")]
pub fn build_sketch_parallel<S, T>(template: &S, items: &[T]) -> Result<S, SketchError>
where
    S: Sketch + Sync,
    T: AsRef<[u8]> + Sync,
{
    items
        .par_iter()
        .fold(
            || template.clone(),
            |mut sketch, item| {
                sketch.insert(item.as_ref());
                sketch
            },
        )
        .map(Ok)
        .reduce(
            || Ok(template.clone()),
            |a, b| {
                let mut a = a?;
                a.merge(&b?)?;
                Ok(a)
            },
        )
}

/// Merge a sequence of sketches into the first one
///
/// Returns `None` for an empty sequence.
pub fn merge_all<S, I>(sketches: I) -> Result<Option<S>, SketchError>
where
    S: Sketch,
    I: IntoIterator<Item = S>,
{
    let mut iter = sketches.into_iter();
    let Some(mut merged) = iter.next() else {
        return Ok(None);
    };
    for sketch in iter {
        merged.merge(&sketch)?;
    }
    Ok(Some(merged))
}
