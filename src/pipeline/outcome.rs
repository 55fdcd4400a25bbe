use crate::batch::writer::{BatchReport, FatalStoreError};
use crate::source::transform::MalformedRecordError;
use crate::store::item::ObjectLocation;
use crate::store::traits::ReadError;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

/// A failure that ended one location's processing.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {location}: {source}")]
    Read {
        location: ObjectLocation,
        #[source]
        source: ReadError,
    },

    #[error("{location}: {source}")]
    Malformed {
        location: ObjectLocation,
        #[source]
        source: MalformedRecordError,
    },

    #[error("{location}: {source}")]
    Store {
        location: ObjectLocation,
        #[source]
        source: FatalStoreError,
    },
}

impl IngestError {
    pub fn location(&self) -> &ObjectLocation {
        match self {
            IngestError::Read { location, .. }
            | IngestError::Malformed { location, .. }
            | IngestError::Store { location, .. } => location,
        }
    }

    /// Batch position within the object, for store failures
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            IngestError::Store { source, .. } => Some(source.batch_index),
            _ => None,
        }
    }
}

/// Everything written for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationReport {
    pub location: ObjectLocation,
    pub batches: usize,
    pub items: usize,
    pub attempts: u64,
}

impl LocationReport {
    pub fn new(location: ObjectLocation) -> Self {
        Self {
            location,
            batches: 0,
            items: 0,
            attempts: 0,
        }
    }

    pub fn record(&mut self, batch: &BatchReport) {
        self.batches += 1;
        self.items += batch.items;
        self.attempts += u64::from(batch.attempts);
    }
}

/// Invocation-level success summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub locations: usize,
    pub batches: usize,
    pub items: usize,
    pub attempts: u64,
}

impl Outcome {
    pub fn record(&mut self, location: &LocationReport) {
        self.locations += 1;
        self.batches += location.batches;
        self.items += location.items;
        self.attempts += location.attempts;
    }

    pub fn message(&self) -> String {
        format!("Processed {} file(s)", self.locations)
    }
}

/// Drive every future to completion, concurrently. Returns all successes and
/// the first error in completion order; a failure never cancels siblings.
pub async fn settle_all<I, F, T, E>(futures: I) -> (Vec<T>, Option<E>)
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = futures.into_iter().collect();
    let mut successes = Vec::with_capacity(pending.len());
    let mut first_error = None;

    while let Some(result) = pending.next().await {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    (successes, first_error)
}
