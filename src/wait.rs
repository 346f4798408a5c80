//! Fixed-interval polling with an optional deadline and cancellation.
//!
//! A check is called until it reports [`Poll::Ready`]. Between checks the
//! loop sleeps for a fixed interval. Errors from the check are returned as-is
//! on the spot: only "not ready yet" is retried.
//!
//! # Example
//!
//! ```ignore
//! use seldon_lifecycle::wait::{poll_until, Poll, WaitOptions};
//!
//! let pod = poll_until(&WaitOptions::default(), &cancel, "wait_for_pod", || async {
//!     let pod = pods.get("model-0").await?;
//!     if is_running(&pod) {
//!         Ok(Poll::Ready(pod))
//!     } else {
//!         Ok(Poll::Pending("pod not running".to_string()))
//!     }
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{Error, Result};

/// Default time between two checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Configuration for a polling wait
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    /// Time slept between two checks
    pub poll_interval: Duration,
    /// Give up once another sleep would pass this deadline (None = wait forever)
    pub timeout: Option<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl WaitOptions {
    /// Wait with the default interval and no deadline
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Wait with the default interval, giving up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }

    /// Set the interval between checks
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Outcome of a single check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Poll<T> {
    /// The condition holds; stop polling and return the value
    Ready(T),
    /// The condition does not hold yet; the message describes what was seen
    Pending(String),
}

/// Call `check` until it returns [`Poll::Ready`].
///
/// - `Ok(Poll::Ready(v))` returns `Ok(v)` immediately.
/// - `Err(e)` returns `Err(e)` immediately, without sleeping.
/// - `Ok(Poll::Pending(_))` sleeps `poll_interval` and checks again, unless
///   the sleep would pass the deadline ([`Error::WaitTimeout`]).
///
/// Cancelling `cancel` interrupts an in-flight check or sleep with
/// [`Error::Cancelled`].
pub async fn poll_until<F, Fut, T>(
    options: &WaitOptions,
    cancel: &CancellationToken,
    operation_name: &str,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            outcome = check() => outcome?,
        };

        let progress = match outcome {
            Poll::Ready(value) => {
                debug!(
                    operation = %operation_name,
                    attempt = attempt,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Condition met"
                );
                return Ok(value);
            }
            Poll::Pending(progress) => progress,
        };

        let elapsed = start.elapsed();
        if let Some(timeout) = options.timeout {
            if elapsed + options.poll_interval > timeout {
                return Err(Error::WaitTimeout {
                    operation: operation_name.to_string(),
                    waited: elapsed,
                    last_progress: progress,
                });
            }
        }

        info!(
            operation = %operation_name,
            attempt = attempt,
            progress = %progress,
            delay_ms = options.poll_interval.as_millis(),
            "Condition not met, polling again"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(options.poll_interval) => {}
        }
    }
}
