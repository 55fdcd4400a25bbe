use crate::batch::backoff::{Backoff, Sleeper, TokioSleeper};
use crate::batch::batcher::Batch;
use crate::config::types::WriterConfig;
use crate::store::item::WriteItem;
use crate::store::traits::{StoreError, TableWriter};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// A batch that stopped on a non-throttling store error. Not retried.
#[derive(Debug, Error)]
#[error("batch {batch_index} failed after {attempts} attempt(s) with {pending} item(s) unwritten: {source}")]
pub struct FatalStoreError {
    pub batch_index: usize,
    pub attempts: u32,
    pub pending: usize,
    #[source]
    pub source: StoreError,
}

/// A batch whose every item the store has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_index: usize,
    pub items: usize,
    pub attempts: u32,
}

/// Result of one submission, as seen by the retry loop.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Every submitted item was accepted
    Done,
    /// The store wrote some items and handed back the rest
    PartialFailure(Vec<WriteItem>),
    /// The whole submission was rejected for capacity; resubmit it unchanged
    ThrottledFailure(StoreError),
    FatalFailure(StoreError),
}

/// Drives one batch to completion against the table's batch put primitive,
/// retrying throttled submissions and unprocessed remainders without limit.
#[derive(Clone)]
pub struct BatchWriter {
    table: Arc<dyn TableWriter>,
    table_name: String,
    throttling_errors: HashSet<String>,
    backoff: Backoff,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("table_name", &self.table_name)
            .field("throttling_errors", &self.throttling_errors)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl BatchWriter {
    pub fn new(table: Arc<dyn TableWriter>, table_name: impl Into<String>, config: &WriterConfig) -> Self {
        Self {
            table,
            table_name: table_name.into(),
            throttling_errors: config.throttling_errors.iter().cloned().collect(),
            backoff: Backoff::from_config(&config.backoff),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn is_throttling(&self, error: &StoreError) -> bool {
        error
            .code()
            .is_some_and(|code| self.throttling_errors.contains(code))
    }

    pub fn classify(&self, result: Result<Vec<WriteItem>, StoreError>) -> AttemptOutcome {
        match result {
            Ok(unprocessed) if unprocessed.is_empty() => AttemptOutcome::Done,
            Ok(unprocessed) => AttemptOutcome::PartialFailure(unprocessed),
            Err(e) if self.is_throttling(&e) => AttemptOutcome::ThrottledFailure(e),
            Err(e) => AttemptOutcome::FatalFailure(e),
        }
    }

    /// Write `batch` until the store has accepted every item, or fail on the
    /// first non-throttling error.
    pub async fn write(&self, batch: Batch) -> Result<BatchReport, FatalStoreError> {
        let Batch { index, items } = batch;
        let total = items.len();
        let mut pending = items;
        let mut attempts: u32 = 0;

        while !pending.is_empty() {
            attempts += 1;
            debug!(
                table = %self.table_name,
                batch_index = index,
                attempt = attempts,
                items = pending.len(),
                "Submitting batch"
            );

            let result = self.table.batch_write(&self.table_name, &pending).await;

            match self.classify(result) {
                AttemptOutcome::Done => break,
                AttemptOutcome::PartialFailure(unprocessed) => {
                    let delay = self.backoff.next_delay();
                    warn!(
                        batch_index = index,
                        attempt = attempts,
                        unprocessed = unprocessed.len(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying unprocessed items"
                    );
                    pending = unprocessed;
                    self.pause(delay).await;
                }
                AttemptOutcome::ThrottledFailure(e) => {
                    let delay = self.backoff.next_delay();
                    warn!(
                        batch_index = index,
                        attempt = attempts,
                        items = pending.len(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Throttled, retrying batch"
                    );
                    self.pause(delay).await;
                }
                AttemptOutcome::FatalFailure(source) => {
                    error!(
                        batch_index = index,
                        attempt = attempts,
                        items = pending.len(),
                        error = %source,
                        "Batch write failed"
                    );
                    return Err(FatalStoreError {
                        batch_index: index,
                        attempts,
                        pending: pending.len(),
                        source,
                    });
                }
            }
        }

        debug!(batch_index = index, items = total, attempts, "Batch written");

        Ok(BatchReport {
            batch_index: index,
            items: total,
            attempts,
        })
    }

    async fn pause(&self, delay: Duration) {
        self.sleeper.sleep(delay).await;
    }
}
