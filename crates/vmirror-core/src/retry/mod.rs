//! Retry and backoff policy for transient browser conditions.
//!
//! The remote catalogue is rebuilt asynchronously while we read it, so an
//! element captured a moment ago can be gone or not yet clickable. This module
//! classifies such errors and retries the operation in place with a short,
//! capped backoff; everything else is surfaced to the caller on first failure.

mod classify;
mod policy;
mod run;

pub use classify::classify;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
