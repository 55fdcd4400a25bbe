pub mod fanout;
pub mod outcome;

pub use fanout::FanoutController;
pub use outcome::{settle_all, IngestError, LocationReport, Outcome};
