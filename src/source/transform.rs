use crate::config::types::TransformConfig;
use crate::source::timestamp::{TimestampError, TimestampParser};
use crate::store::item::WriteItem;
use serde_json::Value;
use thiserror::Error;

/// Why a single input line could not become a write item.
#[derive(Debug, Error)]
pub enum RecordDefect {
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing timestamp field '{0}'")]
    MissingTimestamp(String),

    #[error("field '{field}': {source}")]
    Timestamp {
        field: String,
        #[source]
        source: TimestampError,
    },

    #[error("missing key attribute '{0}'")]
    MissingKeyAttribute(String),
}

/// A line of input that cannot be loaded. Deterministic, never retried.
#[derive(Debug, Error)]
#[error("malformed record at line index {line_index}: {reason}")]
pub struct MalformedRecordError {
    /// Zero-based line position in the raw object
    pub line_index: usize,
    pub raw_line: String,
    #[source]
    pub reason: RecordDefect,
}

/// Turns a newline-delimited JSON object body into write items.
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    timestamp_field: String,
    timestamp: TimestampParser,
    key_attributes: Vec<String>,
}

impl RecordTransformer {
    pub fn new(
        timestamp_field: impl Into<String>,
        timestamp: TimestampParser,
        key_attributes: Vec<String>,
    ) -> Self {
        Self {
            timestamp_field: timestamp_field.into(),
            timestamp,
            key_attributes,
        }
    }

    pub fn from_config(config: &TransformConfig) -> Result<Self, TimestampError> {
        Ok(Self::new(
            config.timestamp_field.clone(),
            TimestampParser::new(&config.timestamp_format)?,
            config.key_attributes.clone(),
        ))
    }

    /// Transform every non-blank line, in input order. Stops at the first
    /// malformed line; nothing is returned for the lines before it.
    pub fn transform(&self, body: &[u8]) -> Result<Vec<WriteItem>, MalformedRecordError> {
        let mut items = Vec::new();

        for (line_index, raw) in body.split(|b| *b == b'\n').enumerate() {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            if raw.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let item = self
                .transform_line(raw)
                .map_err(|reason| MalformedRecordError {
                    line_index,
                    raw_line: String::from_utf8_lossy(raw).into_owned(),
                    reason,
                })?;
            items.push(item);
        }

        Ok(items)
    }

    fn transform_line(&self, raw: &[u8]) -> Result<WriteItem, RecordDefect> {
        let line = std::str::from_utf8(raw).map_err(|_| RecordDefect::InvalidUtf8)?;

        let Value::Object(mut record) = serde_json::from_str::<Value>(line)? else {
            return Err(RecordDefect::NotAnObject);
        };

        let field = &self.timestamp_field;
        let value = record
            .get_mut(field)
            .ok_or_else(|| RecordDefect::MissingTimestamp(field.clone()))?;
        let millis = self
            .timestamp
            .to_epoch_millis(value)
            .map_err(|source| RecordDefect::Timestamp {
                field: field.clone(),
                source,
            })?;
        *value = Value::from(millis);

        if let Some(missing) = self
            .key_attributes
            .iter()
            .find(|attr| !record.contains_key(attr.as_str()))
        {
            return Err(RecordDefect::MissingKeyAttribute(missing.clone()));
        }

        Ok(WriteItem::new(record))
    }
}
