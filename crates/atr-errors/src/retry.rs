//! Sequential retry with linear backoff.
//!
//! Attempt `n` (1-based) that fails is followed by a wait of `delay * n`
//! before attempt `n + 1`. The last attempt is never followed by a wait.
//! This module only drives the attempts; recording the terminal failure is
//! the handler's job (see [`ErrorHandler::retry`](crate::ErrorHandler::retry)).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use atr_config::RetryConfig;
use tokio::sync::watch;

use crate::failure::RawFailure;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Base delay; the wait after failed attempt `n` is `delay * n`.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    #[must_use]
    pub const fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }

    /// Wait after failed attempt `attempt`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay.saturating_mul(attempt)
    }

    const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 { 1 } else { self.max_attempts }
    }
}

/// Cooperative cancellation for an in-flight retry.
///
/// Checked before every attempt and raced against every backoff wait. An
/// attempt already running is allowed to finish.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// How a retry run ended.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded(T),
    /// Every attempt failed; `last` is the final attempt's failure.
    Exhausted { attempts: u32, last: RawFailure },
    /// Stopped by a [`CancelSignal`] after `attempts` attempts.
    Cancelled { attempts: u32 },
}

/// Run `operation` under `policy` until it succeeds, attempts run out, or
/// `cancel` fires. Attempts never overlap.
pub async fn run<T, E, F, Fut>(
    policy: RetryPolicy,
    cancel: Option<&CancelSignal>,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<RawFailure>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        if cancel.is_some_and(CancelSignal::is_cancelled) {
            return RetryOutcome::Cancelled {
                attempts: attempt - 1,
            };
        }

        let failure = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "operation succeeded after retry");
                }
                return RetryOutcome::Succeeded(value);
            }
            Err(error) => error.into(),
        };

        if attempt >= max_attempts {
            return RetryOutcome::Exhausted {
                attempts: attempt,
                last: failure,
            };
        }

        let wait = policy.backoff(attempt);
        tracing::debug!(
            attempt,
            max_attempts,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            error = %failure,
            "attempt failed; backing off"
        );
        match cancel {
            Some(signal) => {
                tokio::select! {
                    () = tokio::time::sleep(wait) => {}
                    () = signal.cancelled() => {
                        return RetryOutcome::Cancelled { attempts: attempt };
                    }
                }
            }
            None => tokio::time::sleep(wait).await,
        }
        attempt += 1;
    }
}
