use crate::cli::{build_controller, invoke, InvocationResponse};
use crate::cli::run::RunError;
use crate::config::Config;
use crate::pipeline::FanoutController;
use crate::store::{DynamoDbTableWriter, S3ObjectReader};
use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{service_fn, LambdaEvent};
use std::sync::Arc;
use tracing::{error, info};

/// Serve S3 notifications from the Lambda runtime until it shuts us down.
pub async fn run(config: Config) -> Result<(), RunError> {
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let reader = Arc::new(S3ObjectReader::new(&sdk_config, &config.source));
    let table = Arc::new(DynamoDbTableWriter::new(&sdk_config, &config.table));
    let controller = build_controller(&config, reader, table)?;

    info!(table = %config.table.name, "Starting Lambda handler");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<S3Event>| {
        let controller = controller.clone();
        async move { handle(&controller, event).await }
    }))
    .await
    .map_err(|e| RunError::Runtime(e.to_string()))
}

pub async fn handle(
    controller: &FanoutController,
    event: LambdaEvent<S3Event>,
) -> Result<InvocationResponse, lambda_runtime::Error> {
    let (payload, context) = event.into_parts();

    info!(
        request_id = %context.request_id,
        records = payload.records.len(),
        "Received S3 event"
    );

    match invoke(controller, &payload).await {
        Ok(response) => {
            info!(request_id = %context.request_id, message = %response.message, "Invocation succeeded");
            Ok(response)
        }
        Err(e) => {
            error!(request_id = %context.request_id, error = %e, "Invocation failed");
            Err(e.into())
        }
    }
}
