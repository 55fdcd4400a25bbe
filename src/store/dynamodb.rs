//! DynamoDB batch writer
//!
//! Provides `DynamoDbTableWriter`, which implements `TableWriter` on top of
//! `BatchWriteItem`. Items are converted from JSON to DynamoDB attribute maps
//! with `serde_dynamo`. Unprocessed requests returned by the service are
//! mapped back onto the submitted items by attribute-map equality.

use crate::config::types::TableConfig;
use crate::store::item::WriteItem;
use crate::store::traits::{StoreError, TableWriter};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use aws_smithy_types::timeout::TimeoutConfig;
use std::collections::HashMap;
use std::fmt::Debug;

/// DynamoDB-backed `TableWriter`
#[derive(Clone)]
pub struct DynamoDbTableWriter {
    client: Client,
}

impl Debug for DynamoDbTableWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbTableWriter").finish()
    }
}

impl DynamoDbTableWriter {
    /// Build a client from the shared SDK config, applying the table's
    /// region, endpoint and timeout overrides.
    pub fn new(sdk_config: &aws_config::SdkConfig, config: &TableConfig) -> Self {
        // Inherit from SdkConfig (HTTP client, retry config, credentials) then override
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = &config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
        }

        // e.g. DynamoDB Local
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if let Some(timeout) = config.timeout {
            let timeout_config = TimeoutConfig::builder().operation_timeout(timeout).build();
            builder = builder.timeout_config(timeout_config);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Create from a pre-built client (for testing)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableWriter for DynamoDbTableWriter {
    async fn batch_write(
        &self,
        table: &str,
        items: &[WriteItem],
    ) -> Result<Vec<WriteItem>, StoreError> {
        let requests = items
            .iter()
            .map(to_write_request)
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests.clone())
            .send()
            .await
            .map_err(map_sdk_error)?;

        let unprocessed = output
            .unprocessed_items
            .and_then(|mut by_table| by_table.remove(table))
            .unwrap_or_default();

        match_unprocessed(items, &requests, unprocessed)
    }
}

fn to_write_request(item: &WriteItem) -> Result<WriteRequest, StoreError> {
    let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(item.attributes())
        .map_err(|e| StoreError::InvalidItem(e.to_string()))?;

    let put = PutRequest::builder()
        .set_item(Some(attributes))
        .build()
        .map_err(|e| StoreError::InvalidItem(e.to_string()))?;

    Ok(WriteRequest::builder().put_request(put).build())
}

/// Map each unprocessed request back to the submitted item it came from.
/// Duplicated items are consumed one submission at a time.
fn match_unprocessed(
    items: &[WriteItem],
    submitted: &[WriteRequest],
    unprocessed: Vec<WriteRequest>,
) -> Result<Vec<WriteItem>, StoreError> {
    let mut taken = vec![false; submitted.len()];
    let mut remainder = Vec::with_capacity(unprocessed.len());

    for request in &unprocessed {
        let position = submitted
            .iter()
            .enumerate()
            .position(|(i, candidate)| !taken[i] && candidate == request)
            .ok_or_else(|| {
                StoreError::Other(format!(
                    "unprocessed request does not match any submitted item: {:?}",
                    request
                ))
            })?;
        taken[position] = true;
        remainder.push(items[position].clone());
    }

    Ok(remainder)
}

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    match &err {
        SdkError::ServiceError(_) => StoreError::Service {
            code: err.code().unwrap_or("Unknown").to_string(),
            message: err.message().unwrap_or_default().to_string(),
        },
        // Timeouts, dispatch failures, response errors: no service error code
        _ => StoreError::Transport(DisplayErrorContext(&err).to_string()),
    }
}
