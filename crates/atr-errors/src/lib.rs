//! # atr-errors
//!
//! Client-side error handling for the Atrium console.
//!
//! - [`classify`] maps a [`RawFailure`] to a type and severity
//! - [`ErrorStore`] keeps a bounded, observable list of recent errors
//! - [`ErrorHandler`] is the facade screens call: record, wrap, retry
//! - [`summarize`] and [`ErrorView`] prepare records for display
//! - [`RecoveryBoundary`] replaces a failing render step with a fallback
//!
//! ```no_run
//! use atr_errors::{ErrorHandler, RawFailure};
//!
//! # async fn demo() {
//! let handler = ErrorHandler::default();
//! let products = handler
//!     .retry_default(|| async { Err::<Vec<String>, _>(RawFailure::status(503)) })
//!     .await;
//! assert!(products.is_none());
//! assert_eq!(handler.store().len(), 1);
//! # }
//! ```

pub mod boundary;
pub mod classify;
pub mod dedup;
pub mod failure;
pub mod handler;
pub mod http;
pub mod retry;
pub mod stats;
pub mod store;
pub mod view;

pub use boundary::{BoundaryFailure, BoundaryState, RecoveryBoundary};
pub use classify::{Classification, classify};
pub use dedup::{DUPLICATE_WINDOW_MS, is_duplicate};
pub use failure::{RawFailure, RequestInfo, ResponseInfo};
pub use handler::{ErrorHandler, ErrorInput, ErrorOptions, ValidationOptions};
pub use http::{check_response, check_response_for};
pub use retry::{CancelSignal, RetryOutcome, RetryPolicy};
pub use stats::{ErrorSummary, SeverityCount, TypeCount, summarize};
pub use store::{DEFAULT_MAX_ERRORS, ErrorStore, NewError};
pub use view::{ErrorView, TechnicalDetails};

pub use atr_core::{ErrorCode, ErrorRecord, ErrorType, Severity};
