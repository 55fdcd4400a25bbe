use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("invalid timestamp format '{0}'")]
    InvalidFormat(String),

    #[error("expected {expected} timestamp, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to parse timestamp '{value}' with format '{format}': {source}")]
    ParseError {
        value: String,
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("timestamp '{0}' is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    Strptime(String),
    Iso8601,
    Epoch,
    EpochMs,
}

impl TimestampFormat {
    /// Parse a format name: 'iso8601', 'epoch', 'epoch_ms', or a strptime format string.
    pub fn parse(format: &str) -> Result<Self, TimestampError> {
        let parsed = match format {
            "iso8601" => TimestampFormat::Iso8601,
            "epoch" => TimestampFormat::Epoch,
            "epoch_ms" => TimestampFormat::EpochMs,
            "" => return Err(TimestampError::InvalidFormat(format.to_string())),
            other => {
                if StrftimeItems::new(other).any(|item| matches!(item, Item::Error)) {
                    return Err(TimestampError::InvalidFormat(other.to_string()));
                }
                TimestampFormat::Strptime(other.to_string())
            }
        };
        Ok(parsed)
    }

    fn name(&self) -> &str {
        match self {
            TimestampFormat::Iso8601 => "iso8601",
            TimestampFormat::Epoch => "epoch",
            TimestampFormat::EpochMs => "epoch_ms",
            TimestampFormat::Strptime(fmt) => fmt,
        }
    }
}

/// Coerces a JSON timestamp value into epoch milliseconds.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    format: TimestampFormat,
}

impl TimestampParser {
    pub fn new(format: &str) -> Result<Self, TimestampError> {
        Ok(Self {
            format: TimestampFormat::parse(format)?,
        })
    }

    pub fn format(&self) -> &TimestampFormat {
        &self.format
    }

    /// Convert a field value to epoch milliseconds.
    ///
    /// Epoch formats accept either a JSON number or a numeric string; every
    /// other format requires a string.
    pub fn to_epoch_millis(&self, value: &Value) -> Result<i64, TimestampError> {
        match (&self.format, value) {
            (TimestampFormat::Epoch, Value::Number(n)) => {
                let seconds = n.as_i64().ok_or_else(|| TimestampError::OutOfRange(n.to_string()))?;
                seconds
                    .checked_mul(1000)
                    .ok_or_else(|| TimestampError::OutOfRange(n.to_string()))
            }
            (TimestampFormat::EpochMs, Value::Number(n)) => {
                n.as_i64().ok_or_else(|| TimestampError::OutOfRange(n.to_string()))
            }
            (_, Value::String(s)) => self.parse_str(s).map(|dt| dt.timestamp_millis()),
            (format, other) => Err(TimestampError::UnexpectedType {
                expected: match format {
                    TimestampFormat::Epoch | TimestampFormat::EpochMs => "numeric or string",
                    _ => "string",
                },
                found: json_type_name(other),
            }),
        }
    }

    fn parse_str(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        let value = value.trim();
        match &self.format {
            TimestampFormat::Iso8601 => self.parse_iso8601(value),
            TimestampFormat::Epoch => self.parse_epoch(value),
            TimestampFormat::EpochMs => self.parse_epoch_ms(value),
            TimestampFormat::Strptime(fmt) => self.parse_strptime(value, fmt),
        }
    }

    fn parse_error<E>(&self, value: &str, err: E) -> TimestampError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TimestampError::ParseError {
            value: value.to_string(),
            format: self.format.name().to_string(),
            source: Box::new(err),
        }
    }

    fn parse_iso8601(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        // RFC3339 covers ISO8601 with an explicit offset
        let rfc3339_err = match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => return Ok(dt.with_timezone(&Utc)),
            Err(e) => e,
        };

        // Offset-less forms are read as UTC
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Ok(Utc.from_utc_datetime(&ndt));
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&ndt));
            }
        }

        Err(self.parse_error(value, rfc3339_err))
    }

    fn parse_epoch(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        let seconds: i64 = value.parse().map_err(|e| self.parse_error(value, e))?;

        Utc.timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| TimestampError::OutOfRange(value.to_string()))
    }

    fn parse_epoch_ms(&self, value: &str) -> Result<DateTime<Utc>, TimestampError> {
        let millis: i64 = value.parse().map_err(|e| self.parse_error(value, e))?;

        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| TimestampError::OutOfRange(value.to_string()))
    }

    fn parse_strptime(&self, value: &str, format: &str) -> Result<DateTime<Utc>, TimestampError> {
        if format.contains("%z") || format.contains("%Z") || format.contains("%:z") {
            DateTime::parse_from_str(value, format)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| self.parse_error(value, e))
        } else {
            // Naive datetime, assume UTC
            NaiveDateTime::parse_from_str(value, format)
                .map(|ndt| Utc.from_utc_datetime(&ndt))
                .map_err(|e| self.parse_error(value, e))
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
