//! The error handling facade.
//!
//! [`ErrorHandler`] is what application actions talk to: it turns raw
//! failures into classified records, pushes them to the shared store, and
//! runs operations with failure capture and retry. Every entry point records
//! its failure before returning, except the intermediate attempts of a retry.

use std::future::Future;
use std::time::Duration;

use atr_config::AtriumConfig;
use atr_core::{ErrorCode, ErrorType, Severity};
use futures::future::BoxFuture;
use serde_json::{Value, json};

use crate::classify::{Classification, classify};
use crate::failure::RawFailure;
use crate::retry::{self, CancelSignal, RetryOutcome, RetryPolicy};
use crate::store::{ErrorStore, NewError};

/// Caller overrides for `handle_client_error` and `handle_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorOptions {
    /// Only `handle_error` honours a type override.
    pub error_type: Option<ErrorType>,
    pub severity: Option<Severity>,
    pub code: Option<ErrorCode>,
    pub details: Option<Value>,
}

impl ErrorOptions {
    #[must_use]
    pub const fn error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = Some(error_type);
        self
    }

    #[must_use]
    pub const fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Caller overrides for `handle_validation_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// The rejected input, shown alongside the field name.
    pub value: Option<Value>,
    pub severity: Option<Severity>,
}

/// What `handle_error` accepts: a bare message or a captured failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorInput {
    Message(String),
    Failure(RawFailure),
}

impl From<&str> for ErrorInput {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for ErrorInput {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<RawFailure> for ErrorInput {
    fn from(failure: RawFailure) -> Self {
        Self::Failure(failure)
    }
}

impl From<anyhow::Error> for ErrorInput {
    fn from(error: anyhow::Error) -> Self {
        Self::Failure(error.into())
    }
}

/// Operation-facing error API over a shared [`ErrorStore`].
#[derive(Debug, Clone, Default)]
pub struct ErrorHandler {
    store: ErrorStore,
    retry_policy: RetryPolicy,
}

impl ErrorHandler {
    #[must_use]
    pub fn new(store: ErrorStore) -> Self {
        Self {
            store,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// A handler over a fresh store, both sized from `config`.
    #[must_use]
    pub fn from_config(config: &AtriumConfig) -> Self {
        Self {
            store: ErrorStore::from_config(&config.errors),
            retry_policy: RetryPolicy::from_config(&config.retry),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &ErrorStore {
        &self.store
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    // -- handlers -------------------------------------------------------------

    /// Classify a failure from an API call and record it.
    ///
    /// `code` is the HTTP status (or failure code) and `details` carries the
    /// request/response context when present.
    pub fn handle_api_error(&self, failure: &RawFailure) -> String {
        let Classification {
            error_type,
            severity,
        } = classify(failure);
        let mut new = NewError::new(failure.message())
            .with_type(error_type)
            .with_severity(severity);
        new.code = failure.code();
        new.details = failure.details();
        if keeps_stack(error_type) {
            new.stack = failure.stack().map(str::to_string);
        }
        self.record(new)
    }

    /// Record a validation failure on `field`.
    pub fn handle_validation_error(
        &self,
        field: &str,
        message: impl Into<String>,
        options: ValidationOptions,
    ) -> String {
        let new = NewError::new(message)
            .with_type(ErrorType::Validation)
            .with_severity(options.severity.unwrap_or(Severity::Medium))
            .with_details(json!({ "field": field, "value": options.value }));
        self.record(new)
    }

    /// Record a `client` failure. Severity defaults to `high`; `options.error_type` is ignored.
    pub fn handle_client_error(&self, message: impl Into<String>, options: ErrorOptions) -> String {
        let mut new = NewError::new(message)
            .with_type(ErrorType::Client)
            .with_severity(options.severity.unwrap_or(Severity::High));
        new.code = options.code;
        new.details = options.details;
        self.record(new)
    }

    /// Record anything else. Type defaults to `unknown`; the stack is kept
    /// when the input carries one and the resulting type is `unknown` or `client`.
    pub fn handle_error(&self, input: impl Into<ErrorInput>, options: ErrorOptions) -> String {
        let mut new = match input.into() {
            ErrorInput::Message(message) => NewError::new(message),
            ErrorInput::Failure(failure) => {
                let mut new = NewError::new(failure.message());
                new.code = failure.code();
                new.details = failure.details();
                new.stack = failure.stack().map(str::to_string);
                new
            }
        };
        let error_type = options.error_type.unwrap_or(ErrorType::Unknown);
        if !keeps_stack(error_type) {
            new.stack = None;
        }
        new.error_type = Some(error_type);
        new.severity = options.severity;
        if options.code.is_some() {
            new.code = options.code;
        }
        if options.details.is_some() {
            new.details = options.details;
        }
        self.record(new)
    }

    fn record(&self, new: NewError) -> String {
        let error_type = new.resolved_type();
        let severity = new.severity.unwrap_or_default();
        let message = new.resolved_message();
        let id = self.store.add_error(new);
        tracing::warn!(%id, %error_type, %severity, %message, "error recorded");
        id
    }

    /// Route a captured failure: API-shaped failures are classified, anything
    /// else is recorded as `unknown`.
    fn dispatch(&self, failure: RawFailure) -> String {
        if failure.has_api_shape() {
            self.handle_api_error(&failure)
        } else {
            self.handle_error(failure, ErrorOptions::default())
        }
    }

    // -- wrappers -------------------------------------------------------------

    /// Await `operation`, recording its failure if it fails.
    ///
    /// Returns `None` on failure; the error is in the store by the time this
    /// resolves and is never propagated.
    pub async fn capture<T, E, Fut>(&self, operation: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        match operation.await {
            Ok(value) => Some(value),
            Err(error) => {
                self.dispatch(error.into());
                None
            }
        }
    }

    /// Wrap `operation` so that every call goes through [`capture`](Self::capture).
    pub fn with_error_handling<A, T, E, F, Fut>(
        &self,
        operation: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Option<T>> + Send + Sync + 'static
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Into<RawFailure> + Send + 'static,
    {
        let handler = self.clone();
        move |args: A| -> BoxFuture<'static, Option<T>> {
            let handler = handler.clone();
            let pending = operation(args);
            Box::pin(async move { handler.capture(pending).await })
        }
    }

    // -- retry ----------------------------------------------------------------

    /// Try `operation` up to `max_attempts` times, waiting `delay * n` after
    /// failed attempt `n`.
    ///
    /// Success returns the value and records nothing. Exhaustion records one
    /// error from the last failure and returns `None`.
    pub async fn retry<T, E, F, Fut>(
        &self,
        operation: F,
        max_attempts: u32,
        delay: Duration,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        self.retry_with(RetryPolicy::new(max_attempts, delay), operation)
            .await
    }

    /// [`retry`](Self::retry) under this handler's configured policy.
    pub async fn retry_default<T, E, F, Fut>(&self, operation: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        self.retry_with(self.retry_policy, operation).await
    }

    pub async fn retry_with<T, E, F, Fut>(&self, policy: RetryPolicy, operation: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        let outcome = retry::run(policy, None, operation).await;
        self.settle(outcome)
    }

    /// [`retry_with`](Self::retry_with), stopping early once `cancel` fires.
    /// A cancelled retry records nothing.
    pub async fn retry_cancellable<T, E, F, Fut>(
        &self,
        policy: RetryPolicy,
        cancel: &CancelSignal,
        operation: F,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        let outcome = retry::run(policy, Some(cancel), operation).await;
        self.settle(outcome)
    }

    fn settle<T>(&self, outcome: RetryOutcome<T>) -> Option<T> {
        match outcome {
            RetryOutcome::Succeeded(value) => Some(value),
            RetryOutcome::Exhausted { attempts, last } => {
                tracing::warn!(attempts, error = %last, "retries exhausted");
                self.handle_api_error(&last);
                None
            }
            RetryOutcome::Cancelled { attempts } => {
                tracing::debug!(attempts, "retry cancelled");
                None
            }
        }
    }
}

/// Raw traces are only kept on records that came from an unclassified exception.
const fn keeps_stack(error_type: ErrorType) -> bool {
    matches!(error_type, ErrorType::Client | ErrorType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{RequestInfo, ResponseInfo};
    use pretty_assertions::assert_eq;

    fn handler() -> ErrorHandler {
        ErrorHandler::new(ErrorStore::default())
    }

    #[test]
    fn api_error_carries_status_and_request_context() {
        let handler = handler();
        let failure = RawFailure::Response {
            response: ResponseInfo {
                status: Some(403),
                status_text: Some("Forbidden".into()),
                data: None,
            },
            request: Some(RequestInfo {
                url: Some("/api/permissions".into()),
                method: Some("PUT".into()),
            }),
            message: "Request failed with status code 403".into(),
        };

        let id = handler.handle_api_error(&failure);
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Authorization);
        assert_eq!(record.severity, Severity::High);
        assert_eq!(record.code, Some(ErrorCode::Status(403)));
        assert_eq!(
            record.details,
            Some(json!({
                "url": "/api/permissions",
                "method": "PUT",
                "status": 403,
                "statusText": "Forbidden"
            }))
        );
        assert_eq!(record.stack, None);
    }

    #[test]
    fn api_error_keeps_stack_only_for_client_classification() {
        let handler = handler();
        let failure = RawFailure::Exception {
            name: None,
            message: "render crashed".into(),
            code: None,
            stack: Some("caused by: bad index".into()),
        };
        let id = handler.handle_api_error(&failure);
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Client);
        assert_eq!(record.stack.as_deref(), Some("caused by: bad index"));
    }

    #[test]
    fn validation_error_records_field_and_value() {
        let handler = handler();
        let id = handler.handle_validation_error(
            "slug",
            "Slug may only contain lowercase letters",
            ValidationOptions {
                value: Some(json!("My Tenant")),
                severity: Some(Severity::Low),
            },
        );
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Validation);
        assert_eq!(record.severity, Severity::Low);
        assert_eq!(
            record.details,
            Some(json!({ "field": "slug", "value": "My Tenant" }))
        );
    }

    #[test]
    fn client_error_defaults_to_high_severity() {
        let handler = handler();
        let id = handler.handle_client_error(
            "Could not render tenant list",
            ErrorOptions::default().details(json!({ "screen": "tenants" })),
        );
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Client);
        assert_eq!(record.severity, Severity::High);
        assert_eq!(record.details, Some(json!({ "screen": "tenants" })));

        let id =
            handler.handle_client_error("minor", ErrorOptions::default().severity(Severity::Low));
        assert_eq!(handler.store().get(&id).unwrap().severity, Severity::Low);
    }

    #[test]
    fn handle_error_with_message_is_unknown() {
        let handler = handler();
        let id = handler.handle_error("something odd", ErrorOptions::default());
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Unknown);
        assert_eq!(record.severity, Severity::Medium);
        assert_eq!(record.stack, None);
    }

    #[test]
    fn handle_error_with_failure_honours_overrides_and_drops_stack() {
        let handler = handler();
        let failure = RawFailure::Exception {
            name: None,
            message: "payment export failed".into(),
            code: Some(ErrorCode::Named("E_EXPORT".into())),
            stack: Some("caused by: csv writer closed".into()),
        };
        let id = handler.handle_error(
            failure,
            ErrorOptions::default()
                .error_type(ErrorType::Server)
                .severity(Severity::Critical),
        );
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Server);
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.code, Some(ErrorCode::Named("E_EXPORT".into())));
        assert_eq!(record.stack, None);
    }

    #[test]
    fn handle_error_keeps_stack_for_unknown_and_client() {
        let handler = handler();
        let failure = RawFailure::Exception {
            name: None,
            message: "widget state corrupted".into(),
            code: None,
            stack: Some("caused by: missing key".into()),
        };

        let id = handler.handle_error(failure.clone(), ErrorOptions::default());
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Unknown);
        assert_eq!(record.stack.as_deref(), Some("caused by: missing key"));

        let id = handler.handle_error(
            failure,
            ErrorOptions::default().error_type(ErrorType::Client),
        );
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.stack.as_deref(), Some("caused by: missing key"));
    }

    #[test]
    fn handle_error_never_stores_stack_on_other_types() {
        let handler = handler();
        for error_type in ErrorType::ALL {
            let failure = RawFailure::Exception {
                name: None,
                message: format!("{error_type} failure"),
                code: None,
                stack: Some("trace".into()),
            };
            let id =
                handler.handle_error(failure, ErrorOptions::default().error_type(error_type));
            let record = handler.store().get(&id).unwrap();
            assert_eq!(record.stack.is_some(), keeps_stack(error_type), "{error_type}");
        }
    }

    #[test]
    fn client_error_is_always_client_typed() {
        let handler = handler();
        let id = handler.handle_client_error(
            "layout overflow",
            ErrorOptions::default().error_type(ErrorType::Server),
        );
        let record = handler.store().get(&id).unwrap();
        assert_eq!(record.error_type, ErrorType::Client);
    }

    #[tokio::test]
    async fn capture_returns_value_on_success() {
        let handler = handler();
        let value = handler.capture(async { Ok::<_, RawFailure>(42) }).await;
        assert_eq!(value, Some(42));
        assert!(handler.store().is_empty());
    }

    #[tokio::test]
    async fn capture_routes_api_shaped_failures_through_classifier() {
        let handler = handler();
        let value: Option<()> = handler
            .capture(async { Err(RawFailure::network("Network Error")) })
            .await;
        assert_eq!(value, None);
        let records = handler.store().errors();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error_type, ErrorType::Network);
        assert_eq!(records[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn wrapped_operation_passes_arguments_through() {
        let handler = handler();
        let fetch = handler.with_error_handling(|tenant_id: u32| async move {
            if tenant_id == 0 {
                Err(RawFailure::status(404))
            } else {
                Ok(format!("tenant-{tenant_id}"))
            }
        });

        assert_eq!(fetch(7).await.as_deref(), Some("tenant-7"));
        assert_eq!(fetch(0).await, None);
        let records = handler.store().errors();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error_type, ErrorType::Client);
        assert_eq!(records[0].code, Some(ErrorCode::Status(404)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_default_uses_configured_policy() {
        let config = AtriumConfig {
            retry: atr_config::RetryConfig {
                max_attempts: 2,
                delay_ms: 10,
            },
            ..AtriumConfig::default()
        };
        let handler = ErrorHandler::from_config(&config);
        let mut calls = 0;
        let value: Option<()> = handler
            .retry_default(|| {
                calls += 1;
                async { Err(RawFailure::status(500)) }
            })
            .await;
        assert_eq!(value, None);
        assert_eq!(calls, 2);
        assert_eq!(handler.store().len(), 1);
        assert_eq!(handler.store().errors()[0].error_type, ErrorType::Server);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_retry_records_nothing() {
        let handler = handler();
        let cancel = CancelSignal::new();
        cancel.cancel();
        let value: Option<()> = handler
            .retry_cancellable(RetryPolicy::default(), &cancel, || async {
                Err(RawFailure::status(502))
            })
            .await;
        assert_eq!(value, None);
        assert!(handler.store().is_empty());
    }
}
