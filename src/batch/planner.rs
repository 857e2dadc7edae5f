//! # Batch Planner
//!
//! Contiguous, exhaustive partitioning of an identifier list.

use std::num::NonZeroUsize;
use std::ops::Range;

use crate::models::Identifier;

/// A bounded slice of the caller's identifiers, queried by one remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the plan; used to restore order
    pub index: usize,
    /// Position of the first item in the original input
    pub offset: usize,
    pub items: Vec<Identifier>,
}

impl Chunk {
    /// Positions covered in the original input
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split `identifiers` into `ceil(len / max_batch_size)` chunks
///
/// Every chunk holds `max_batch_size` items except possibly the last. An
/// empty input produces no chunks at all.
pub fn plan(identifiers: &[Identifier], max_batch_size: NonZeroUsize) -> Vec<Chunk> {
    let size = max_batch_size.get();
    identifiers
        .chunks(size)
        .enumerate()
        .map(|(index, items)| Chunk {
            index,
            offset: index * size,
            items: items.to_vec(),
        })
        .collect()
}
