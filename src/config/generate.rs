pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# S3DDB CONFIGURATION
# =============================================================================
# Loads newline-delimited JSON objects from S3 into a DynamoDB table.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/s3ddb/config.yml
#   3. /etc/s3ddb/config.yml
#
# With no config file, defaults are used and the table name / region are taken
# from the TABLE_NAME and AWS_REGION environment variables. Any value below may
# reference the environment with $env{VAR_NAME}.

# =============================================================================
# TABLE
# =============================================================================
table:
  # Destination table (falls back to TABLE_NAME when empty)
  name: $env{TABLE_NAME}
  # Region override (falls back to AWS_REGION, then the SDK default chain)
  # region: us-east-1
  # Endpoint override, e.g. DynamoDB Local
  # endpoint: http://localhost:8000
  # Per-operation timeout, including the SDK's own retries
  # timeout: 10s

# =============================================================================
# SOURCE
# =============================================================================
# source:
#   region: us-east-1
#   endpoint: http://localhost:4566
#   timeout: 30s

# =============================================================================
# TRANSFORM
# =============================================================================
transform:
  # Field rewritten from its textual form to epoch milliseconds
  timestamp_field: StatusTime
  # Format: 'iso8601', 'epoch', 'epoch_ms', or a strptime format string
  timestamp_format: iso8601
  # Attributes every record must carry (normally the table's key schema)
  key_attributes: []

# =============================================================================
# WRITER
# =============================================================================
writer:
  # Items per BatchWriteItem call (1-25)
  batch_size: 25
  # Retry delays are drawn uniformly from [min, max)
  backoff:
    min: 1000ms
    max: 3000ms
  # Error codes treated as transient capacity errors (retried indefinitely)
  throttling_errors:
    - ProvisionedThroughputExceededException
    - ThrottlingException
"#
    .to_string()
}
