use crate::config::types::MAX_BATCH_SIZE;
use crate::store::item::WriteItem;

/// An ordered group of items submitted to the table in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Position of this batch within its object
    pub index: usize,
    pub items: Vec<WriteItem>,
}

/// Splits items into fixed-capacity batches.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    capacity: usize,
}

impl Batcher {
    /// `capacity` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn split(&self, items: Vec<WriteItem>) -> Vec<Batch> {
        chunk(items, self.capacity)
            .into_iter()
            .enumerate()
            .map(|(index, items)| Batch { index, items })
            .collect()
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(MAX_BATCH_SIZE)
    }
}

/// Order-preserving split into chunks of `capacity` (the last may be shorter).
/// Zero items yield zero chunks.
pub fn chunk<T>(items: Vec<T>, capacity: usize) -> Vec<Vec<T>> {
    let capacity = capacity.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(capacity));
    let mut iter = items.into_iter().peekable();

    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(capacity).collect());
    }

    chunks
}
