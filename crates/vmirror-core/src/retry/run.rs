//! Retry loop: run a browser operation until success or the policy says stop.

use super::classify::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::browse::BrowseError;

/// Runs `op` against `browser` until it succeeds or the retry policy says to stop.
///
/// The browser is lent to each attempt rather than captured, so the operation
/// re-resolves its locators from the live page every time it runs. Transient
/// errors are retried after the backoff delay; any other error is returned as is.
pub async fn run_with_retry<B, T, F>(
    policy: &RetryPolicy,
    browser: &mut B,
    mut op: F,
) -> Result<T, BrowseError>
where
    B: ?Sized,
    F: AsyncFnMut(&mut B) -> Result<T, BrowseError>,
{
    let mut attempt = 1u32;
    loop {
        match op(&mut *browser).await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    tracing::trace!(attempt, error = %e, "transient browser condition, retrying");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            },
        }
    }
}
