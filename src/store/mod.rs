pub mod dynamodb;
pub mod item;
pub mod local;
pub mod memory;
pub mod s3;
pub mod traits;

pub use dynamodb::DynamoDbTableWriter;
pub use item::{ObjectLocation, WriteItem};
pub use local::LocalObjectReader;
pub use memory::MemoryTable;
pub use s3::S3ObjectReader;
pub use traits::{ObjectReader, ReadError, StoreError, TableWriter};
