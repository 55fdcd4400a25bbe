//! S3 object reader

use crate::config::types::SourceConfig;
use crate::store::item::ObjectLocation;
use crate::store::traits::{ObjectReader, ReadError};
use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::Client;
use aws_smithy_types::timeout::TimeoutConfig;
use std::fmt::Debug;

#[derive(Clone)]
pub struct S3ObjectReader {
    client: Client,
}

impl Debug for S3ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectReader").finish()
    }
}

impl S3ObjectReader {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: &SourceConfig) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);

        if let Some(region) = &config.region {
            builder = builder.region(aws_sdk_s3::config::Region::new(region.clone()));
        }

        // LocalStack/MinIO need path-style addressing
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
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
impl ObjectReader for S3ObjectReader {
    async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ReadError> {
        let response = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|e| map_s3_error(e, location))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ReadError::Io(format!("failed to read body of {}: {}", location, e)))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }
}

fn map_s3_error<E>(err: SdkError<E, aws_sdk_s3::config::http::HttpResponse>, location: &ObjectLocation) -> ReadError
where
    E: std::error::Error + 'static,
{
    match &err {
        SdkError::ServiceError(service_err) => match service_err.raw().status().as_u16() {
            404 => ReadError::NotFound(location.to_string()),
            401 | 403 => ReadError::Access(location.to_string()),
            status => ReadError::Io(format!(
                "S3 error for {} (HTTP {}): {}",
                location,
                status,
                DisplayErrorContext(&err)
            )),
        },
        SdkError::TimeoutError(_) => {
            ReadError::Io(format!("S3 timeout for {}: {}", location, DisplayErrorContext(&err)))
        }
        _ => ReadError::Io(format!("S3 error for {}: {}", location, DisplayErrorContext(&err))),
    }
}
