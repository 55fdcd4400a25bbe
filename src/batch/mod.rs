pub mod backoff;
pub mod batcher;
pub mod writer;

pub use backoff::{Backoff, Jitter, RandomJitter, Sleeper, TokioSleeper};
pub use batcher::{chunk, Batch, Batcher};
pub use writer::{AttemptOutcome, BatchReport, BatchWriter, FatalStoreError};
