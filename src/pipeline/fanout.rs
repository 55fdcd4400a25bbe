use crate::batch::{Batcher, BatchWriter};
use crate::pipeline::outcome::{settle_all, IngestError, LocationReport, Outcome};
use crate::source::transform::RecordTransformer;
use crate::store::item::ObjectLocation;
use crate::store::traits::ObjectReader;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reads, transforms, batches and writes every object named by an event.
///
/// All locations run concurrently, and all batches of a location run
/// concurrently. Every branch runs to completion; the invocation fails with
/// the first error to occur if any branch failed.
#[derive(Clone)]
pub struct FanoutController {
    reader: Arc<dyn ObjectReader>,
    transformer: RecordTransformer,
    batcher: Batcher,
    writer: BatchWriter,
}

impl std::fmt::Debug for FanoutController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutController")
            .field("transformer", &self.transformer)
            .field("batcher", &self.batcher)
            .field("writer", &self.writer)
            .finish()
    }
}

impl FanoutController {
    pub fn new(
        reader: Arc<dyn ObjectReader>,
        transformer: RecordTransformer,
        batcher: Batcher,
        writer: BatchWriter,
    ) -> Self {
        Self {
            reader,
            transformer,
            batcher,
            writer,
        }
    }

    pub async fn process(&self, locations: &[ObjectLocation]) -> Result<Outcome, IngestError> {
        info!(locations = locations.len(), table = %self.writer.table_name(), "Processing event");

        let (reports, first_error) =
            settle_all(locations.iter().map(|location| self.process_location(location))).await;

        if let Some(e) = first_error {
            error!(
                bucket = %e.location().bucket,
                key = %e.location().key,
                error = %e,
                completed = reports.len(),
                "Invocation failed"
            );
            return Err(e);
        }

        let mut outcome = Outcome::default();
        for report in &reports {
            outcome.record(report);
        }

        info!(
            locations = outcome.locations,
            batches = outcome.batches,
            items = outcome.items,
            attempts = outcome.attempts,
            "Invocation complete"
        );

        Ok(outcome)
    }

    /// Read -> transform -> batch -> write for one object. The whole object is
    /// transformed before any batch is submitted.
    pub async fn process_location(
        &self,
        location: &ObjectLocation,
    ) -> Result<LocationReport, IngestError> {
        debug!(bucket = %location.bucket, key = %location.key, "Reading object");

        let body = self
            .reader
            .get(location)
            .await
            .map_err(|source| IngestError::Read {
                location: location.clone(),
                source,
            })?;

        let items = self
            .transformer
            .transform(&body)
            .map_err(|source| IngestError::Malformed {
                location: location.clone(),
                source,
            })?;

        let batches = self.batcher.split(items);
        info!(
            bucket = %location.bucket,
            key = %location.key,
            bytes = body.len(),
            batches = batches.len(),
            "Writing object"
        );

        let (written, first_error) =
            settle_all(batches.into_iter().map(|batch| self.writer.write(batch))).await;

        if let Some(source) = first_error {
            return Err(IngestError::Store {
                location: location.clone(),
                source,
            });
        }

        let mut report = LocationReport::new(location.clone());
        for batch in &written {
            report.record(batch);
        }

        info!(
            bucket = %location.bucket,
            key = %location.key,
            items = report.items,
            attempts = report.attempts,
            "Object written"
        );

        Ok(report)
    }
}
