use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest number of put requests DynamoDB accepts in one `BatchWriteItem` call.
pub const MAX_BATCH_SIZE: usize = 25;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub writer: WriterConfig,
}

/// Destination table. `name` and `region` fall back to `TABLE_NAME` / `AWS_REGION`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub name: String,
    pub region: Option<String>,
    /// Endpoint override (e.g. DynamoDB Local)
    pub endpoint: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Object store the inbound event points at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    /// One of: 'iso8601', 'epoch', 'epoch_ms', or a strptime format string
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Attributes every record must carry; normally the table's key schema
    #[serde(default)]
    pub key_attributes: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            timestamp_field: default_timestamp_field(),
            timestamp_format: default_timestamp_format(),
            key_attributes: Vec::new(),
        }
    }
}

fn default_timestamp_field() -> String {
    "StatusTime".to_string()
}

fn default_timestamp_format() -> String {
    "iso8601".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default = "default_throttling_errors")]
    pub throttling_errors: Vec<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            backoff: BackoffConfig::default(),
            throttling_errors: default_throttling_errors(),
        }
    }
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

pub fn default_throttling_errors() -> Vec<String> {
    vec![
        "ProvisionedThroughputExceededException".to_string(),
        "ThrottlingException".to_string(),
    ]
}

/// Retry delays are drawn uniformly from `[min, max)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    #[serde(default = "default_backoff_min", with = "humantime_serde")]
    pub min: Duration,
    #[serde(default = "default_backoff_max", with = "humantime_serde")]
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: default_backoff_min(),
            max: default_backoff_max(),
        }
    }
}

fn default_backoff_min() -> Duration {
    Duration::from_millis(1000)
}

fn default_backoff_max() -> Duration {
    Duration::from_millis(3000)
}
