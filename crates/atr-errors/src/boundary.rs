//! A supervisor that turns a failing step into a fallback.
//!
//! `RecoveryBoundary` owns a fallback builder. While healthy, each `render`
//! runs the step and returns its value. The first `Err` or panic flips the
//! boundary to `Failed`; from then on `render` returns the fallback without
//! touching the step until [`RecoveryBoundary::reset`] is called.
//!
//! Captured failures are logged but never stored. Owners that want them in
//! an [`ErrorStore`](crate::ErrorStore) forward them from the `on_error` hook.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use futures::FutureExt;

type Fallback<T> = Box<dyn Fn(&BoundaryFailure) -> T + Send + Sync>;
type Hook = Box<dyn Fn(&BoundaryFailure) + Send + Sync>;

/// What a boundary caught.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFailure {
    pub message: String,
    /// `Debug` rendering of the error, or `panicked: <payload>` for a panic.
    pub trace: String,
    pub occurred_at: DateTime<Utc>,
}

impl BoundaryFailure {
    fn from_error<E: fmt::Display + fmt::Debug>(error: &E) -> Self {
        Self {
            message: error.to_string(),
            trace: format!("{error:?}"),
            occurred_at: Utc::now(),
        }
    }

    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());
        Self {
            trace: format!("panicked: {message}"),
            message,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Healthy,
    Failed(BoundaryFailure),
}

pub struct RecoveryBoundary<T> {
    state: BoundaryState,
    fallback: Fallback<T>,
    on_error: Option<Hook>,
}

impl<T> fmt::Debug for RecoveryBoundary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryBoundary")
            .field("state", &self.state)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> RecoveryBoundary<T> {
    pub fn new(fallback: impl Fn(&BoundaryFailure) -> T + Send + Sync + 'static) -> Self {
        Self {
            state: BoundaryState::Healthy,
            fallback: Box::new(fallback),
            on_error: None,
        }
    }

    /// Called once per capture, after logging.
    #[must_use]
    pub fn on_error(mut self, hook: impl Fn(&BoundaryFailure) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub const fn state(&self) -> &BoundaryState {
        &self.state
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&BoundaryFailure> {
        match &self.state {
            BoundaryState::Healthy => None,
            BoundaryState::Failed(failure) => Some(failure),
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// Back to healthy; the next `render` runs its step again.
    pub fn reset(&mut self) {
        if self.is_failed() {
            tracing::debug!("recovery boundary reset");
        }
        self.state = BoundaryState::Healthy;
    }

    /// Run `step` unless already failed. Never propagates the step's error or panic.
    pub fn render<E, F>(&mut self, step: F) -> T
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display + fmt::Debug,
    {
        if let BoundaryState::Failed(failure) = &self.state {
            return (self.fallback)(failure);
        }
        let failure = match panic::catch_unwind(AssertUnwindSafe(step)) {
            Ok(Ok(value)) => return value,
            Ok(Err(error)) => BoundaryFailure::from_error(&error),
            Err(payload) => BoundaryFailure::from_panic(payload.as_ref()),
        };
        self.capture(failure)
    }

    /// Async counterpart of [`render`](Self::render).
    pub async fn render_async<E, F, Fut>(&mut self, step: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display + fmt::Debug,
    {
        if let BoundaryState::Failed(failure) = &self.state {
            return (self.fallback)(failure);
        }
        let outcome = match panic::catch_unwind(AssertUnwindSafe(step)) {
            Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
            Err(payload) => Err(payload),
        };
        let failure = match outcome {
            Ok(Ok(value)) => return value,
            Ok(Err(error)) => BoundaryFailure::from_error(&error),
            Err(payload) => BoundaryFailure::from_panic(payload.as_ref()),
        };
        self.capture(failure)
    }

    fn capture(&mut self, failure: BoundaryFailure) -> T {
        tracing::error!(
            message = %failure.message,
            trace = %failure.trace,
            "recovery boundary caught a failure"
        );
        if let Some(hook) = &self.on_error {
            hook(&failure);
        }
        let output = (self.fallback)(&failure);
        self.state = BoundaryState::Failed(failure);
        output
    }
}
