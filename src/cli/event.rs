use crate::store::item::ObjectLocation;
use aws_lambda_events::event::s3::S3Event;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("record {0}: missing bucket name")]
    MissingBucket(usize),

    #[error("record {0}: missing object key")]
    MissingKey(usize),

    #[error("record {index}: object key '{key}' is not valid URL encoding: {source}")]
    InvalidKey {
        index: usize,
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Object locations named by an S3 notification, in record order.
///
/// Keys arrive form-encoded (`+` for space, `%XX` escapes) and are decoded.
pub fn locations_from_event(event: &S3Event) -> Result<Vec<ObjectLocation>, EventError> {
    event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let bucket = record
                .s3
                .bucket
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or(EventError::MissingBucket(index))?;
            let raw_key = record
                .s3
                .object
                .key
                .as_deref()
                .filter(|key| !key.is_empty())
                .ok_or(EventError::MissingKey(index))?;

            Ok(ObjectLocation::new(bucket, decode_key(index, raw_key)?))
        })
        .collect()
}

fn decode_key(index: usize, raw: &str) -> Result<String, EventError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|key| key.into_owned())
        .map_err(|source| EventError::InvalidKey {
            index,
            key: raw.to_string(),
            source,
        })
}
