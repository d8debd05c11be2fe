//! Bounded retry against the configuration-database-busy signal.
//!
//! ```text
//! ATTEMPT -> SUCCESS
//!         -> BUSY (attempts left) -> sleep(delay) -> ATTEMPT
//!         -> BUSY (budget spent)  -> RetriesExhausted
//!         -> any other error      -> returned as-is
//! ```

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::RetryPolicy;

/// Callback trait for retry progress notifications.
pub trait RetryCallback: Send + Sync {
    /// Called before sleeping ahead of the next attempt.
    ///
    /// # Arguments
    /// * `attempt` - Attempt that just failed (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The busy error that triggered the retry
    /// * `delay` - Time until the next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// No-op callback that does nothing.
pub struct NoCallback;

impl RetryCallback for NoCallback {
    fn on_retry(&self, _attempt: u32, _max_attempts: u32, _error: &Error, _delay: Duration) {}
}

/// Callback that reports retries through the `log` facade.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        log::warn!(
            "attempt {attempt}/{max_attempts}: {error}; retrying in {}s",
            delay.as_secs()
        );
    }
}

/// Run `operation` until it succeeds, fails terminally, or the busy budget is spent.
///
/// The operation receives the 1-indexed attempt number. Only retryable errors
/// (the busy signal) are retried; everything else returns immediately. A busy
/// error on the last attempt is escalated with [`Error::exhausted`].
pub fn with_retry<T, F>(
    policy: &RetryPolicy,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt) {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= max_attempts => return Err(e.exhausted(attempt)),
            Err(e) => {
                if let Some(cb) = callback {
                    cb.on_retry(attempt, max_attempts, &e, policy.delay);
                }
                thread::sleep(policy.delay);
                attempt += 1;
            }
        }
    }
}
