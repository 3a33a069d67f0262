//! End-to-end scenarios through the public facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use atr_errors::{
    ErrorHandler, ErrorOptions, ErrorStore, ErrorType, ErrorView, RawFailure, RecoveryBoundary,
    Severity, ValidationOptions, summarize,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::Instant;

fn counted<T: Clone>(
    fail_times: u32,
    failure: RawFailure,
    value: T,
) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<T, RawFailure>>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let op = move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        std::future::ready(if n <= fail_times {
            Err(failure.clone())
        } else {
            Ok(value.clone())
        })
    };
    (calls, op)
}

#[tokio::test(start_paused = true)]
async fn exhausted_retry_records_exactly_one_error() {
    let handler = ErrorHandler::default();
    let (calls, op) = counted(u32::MAX, RawFailure::status(503), ());

    let start = Instant::now();
    let result = handler.retry(op, 3, Duration::from_millis(500)).await;
    let elapsed = start.elapsed();

    assert_eq!(result, None);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(1510));

    let records = handler.store().errors();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_type, ErrorType::Server);
    assert_eq!(records[0].severity, Severity::High);
    assert_eq!(records[0].message, "Request failed with status code 503");
}

#[tokio::test(start_paused = true)]
async fn concurrent_exhausted_retries_each_record_once() {
    let handler = ErrorHandler::default();
    let (orders_calls, orders) = counted(u32::MAX, RawFailure::status(502), ());
    let (users_calls, users) = counted(u32::MAX, RawFailure::network("Network Error"), ());

    let start = Instant::now();
    let (a, b) = tokio::join!(
        handler.retry(orders, 3, Duration::from_millis(500)),
        handler.retry(users, 2, Duration::from_millis(300)),
    );

    assert_eq!((a, b), (None, None));
    assert_eq!(orders_calls.load(Ordering::SeqCst), 3);
    assert_eq!(users_calls.load(Ordering::SeqCst), 2);
    // Waits overlap: the longer retry (500ms + 1000ms) bounds the total.
    assert!(start.elapsed() < Duration::from_millis(1510));

    let records = handler.store().errors();
    assert_eq!(records.len(), 2);
    // The shorter retry exhausts first.
    assert_eq!(records[0].error_type, ErrorType::Network);
    assert_eq!(records[1].error_type, ErrorType::Server);
}

#[tokio::test(start_paused = true)]
async fn retry_that_recovers_records_nothing() {
    let handler = ErrorHandler::default();
    let (calls, op) = counted(2, RawFailure::network("Network Error"), "catalog");

    let result = handler.retry(op, 3, Duration::from_millis(500)).await;

    assert_eq!(result, Some("catalog"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(handler.store().is_empty());
}

#[test]
fn email_validation_is_recorded_with_field_context() {
    let handler = ErrorHandler::default();
    let id = handler.handle_validation_error(
        "email",
        "Email is required",
        ValidationOptions {
            value: Some(json!("")),
            ..ValidationOptions::default()
        },
    );

    let record = handler.store().get(&id).unwrap();
    assert_eq!(record.error_type, ErrorType::Validation);
    assert_eq!(record.severity, Severity::Medium);
    assert_eq!(record.message, "Email is required");
    assert_eq!(record.details, Some(json!({ "field": "email", "value": "" })));
    assert_eq!(record.user_message(), "Please check your input and try again");
}

#[tokio::test]
async fn plain_failure_in_wrapped_action_becomes_unknown() {
    let handler = ErrorHandler::default();
    let save = handler.with_error_handling(|name: String| async move {
        Err::<String, _>(anyhow::anyhow!("cannot read properties of undefined ({name})"))
    });

    assert_eq!(save("draft".to_string()).await, None);

    let records = handler.store().errors();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_type, ErrorType::Unknown);
    assert_eq!(
        records[0].message,
        "cannot read properties of undefined (draft)"
    );
}

#[tokio::test]
async fn wrapped_action_classifies_http_failures() {
    let handler = ErrorHandler::default();
    let load = handler.with_error_handling(|status: u16| async move {
        Err::<(), _>(RawFailure::status(status))
    });

    assert_eq!(load(401).await, None);
    assert_eq!(load(404).await, None);

    let types: Vec<_> = handler
        .store()
        .errors()
        .iter()
        .map(|r| (r.error_type, r.severity))
        .collect();
    assert_eq!(
        types,
        vec![
            (ErrorType::Authentication, Severity::High),
            (ErrorType::Client, Severity::Medium),
        ]
    );
}

#[test]
fn shared_store_is_bounded_and_summarized() {
    let store = ErrorStore::new(3);
    let handler = ErrorHandler::new(store.clone());

    handler.handle_client_error("first", ErrorOptions::default());
    handler.handle_api_error(&RawFailure::status(500));
    handler.handle_api_error(&RawFailure::network("Network Error"));
    handler.handle_error("last", ErrorOptions::default());

    let records = store.errors();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].message, "Request failed with status code 500");

    let summary = summarize(&records);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.most_recent.unwrap().message, "last");
    assert_eq!(
        summary.oldest_unresolved.unwrap().error_type,
        ErrorType::Server
    );
}

#[test]
fn boundary_failures_reach_the_store_through_the_hook() {
    let handler = ErrorHandler::default();
    let forward = handler.clone();
    let mut boundary = RecoveryBoundary::new(|failure| format!("<error-card {}>", failure.message))
        .on_error(move |failure| {
            forward.handle_client_error(failure.message.clone(), ErrorOptions::default());
        });

    let out = boundary.render(|| Err::<String, _>("chart data missing"));
    assert_eq!(out, "<error-card chart data missing>");

    let records = handler.store().errors();
    assert_eq!(records.len(), 1);
    let view = ErrorView::from(&records[0]);
    assert_eq!(view.title, "Something went wrong. Please try again");
    assert_eq!(view.severity, Severity::High);
}
