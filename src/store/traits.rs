use crate::store::item::{ObjectLocation, WriteItem};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Access(String),

    #[error("read failed: {0}")]
    Io(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store answered with an error code (e.g. `ThrottlingException`)
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// No usable answer: timeout, connection failure, undecodable response
    #[error("request failed: {0}")]
    Transport(String),

    /// An item could not be converted into the store's wire format
    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Service error code, if the store returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Reads whole objects from the object store.
#[async_trait]
pub trait ObjectReader: Send + Sync {
    async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ReadError>;
}

/// The table's batch put primitive.
#[async_trait]
pub trait TableWriter: Send + Sync {
    /// Submit one batch of puts. `Ok` carries the items the store declined
    /// to write this time (empty when everything was accepted); each
    /// returned item is a clone of one of `items`.
    async fn batch_write(
        &self,
        table: &str,
        items: &[WriteItem],
    ) -> Result<Vec<WriteItem>, StoreError>;
}
