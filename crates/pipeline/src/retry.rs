//! Retry with timeout and backoff for external calls
//!
//! Each provider call gets a per-attempt timeout. Transient failures
//! (retrieval and generation errors, including timeouts) are retried
//! with exponential backoff and jitter; invalid input never is.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use shop_assistant_core::{Error, Result};

/// Run `op` with a per-attempt timeout, retrying transient failures.
///
/// `max_retries` counts retries after the first attempt. Backoff
/// doubles from `initial_backoff` each retry, with up to 50% jitter
/// added so concurrent callers do not retry in lockstep. A timed-out
/// attempt maps to the error `on_timeout` produces for the stage.
pub async fn call_with_retry<T, F, Fut>(
    label: &str,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    on_timeout: fn(String) -> Error,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let result = match tokio::time::timeout(timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(format!(
                "{} timed out after {}ms",
                label,
                timeout.as_millis()
            ))),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt <= max_retries => {
                let jitter = rand::thread_rng().gen_range(0..=backoff.as_millis() as u64 / 2);
                let wait = backoff + Duration::from_millis(jitter);
                tracing::warn!(
                    stage = label,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(wait).await;
                backoff *= 2;
            },
            Err(err) => return Err(err),
        }
    }
}
