pub mod timestamp;
pub mod transform;

pub use timestamp::{TimestampError, TimestampFormat, TimestampParser};
pub use transform::{MalformedRecordError, RecordTransformer};
