pub mod config;
pub mod event;
pub mod lambda;
pub mod run;

use crate::batch::{BatchWriter, Batcher};
use crate::config::Config;
use crate::pipeline::{FanoutController, IngestError, Outcome};
use crate::source::timestamp::TimestampError;
use crate::source::transform::RecordTransformer;
use crate::store::traits::{ObjectReader, TableWriter};
use aws_lambda_events::event::s3::S3Event;
use event::{locations_from_event, EventError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Why an invocation reported failure to its caller.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("invalid event: {0}")]
    Event(#[from] EventError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Success value returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl From<Outcome> for InvocationResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            message: outcome.message(),
            outcome,
        }
    }
}

/// Wire the fan-out controller from config and the two store collaborators.
pub fn build_controller(
    config: &Config,
    reader: Arc<dyn ObjectReader>,
    table: Arc<dyn TableWriter>,
) -> Result<FanoutController, TimestampError> {
    let transformer = RecordTransformer::from_config(&config.transform)?;
    let batcher = Batcher::new(config.writer.batch_size);
    let writer = BatchWriter::new(table, config.table.name.clone(), &config.writer);

    Ok(FanoutController::new(reader, transformer, batcher, writer))
}

/// Map an S3 notification through the controller to a success/failure signal.
pub async fn invoke(
    controller: &FanoutController,
    event: &S3Event,
) -> Result<InvocationResponse, InvocationError> {
    let locations = locations_from_event(event)?;
    let outcome = controller.process(&locations).await?;
    Ok(outcome.into())
}
