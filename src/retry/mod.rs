//! Bounded retries for reads that may race replication.

pub mod policy;
pub mod reader;

pub use policy::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WAIT, DEFAULT_MIN_WAIT};
pub use reader::{ReadOutcome, RetrySignal, RetryingReader};
