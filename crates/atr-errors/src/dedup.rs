//! Near-duplicate detection.
//!
//! The store never deduplicates on its own. Callers that want to suppress a
//! burst of identical reports check first, either against a pair of records
//! with [`is_duplicate`] or against the store with
//! [`ErrorStore::find_duplicate`](crate::ErrorStore::find_duplicate).

use atr_core::ErrorRecord;
use chrono::{DateTime, Utc};

/// Two reports closer together than this are considered the same event.
pub const DUPLICATE_WINDOW_MS: i64 = 5_000;

/// True iff `a` and `b` share message and type and were created less than
/// [`DUPLICATE_WINDOW_MS`] apart.
#[must_use]
pub fn is_duplicate(a: &ErrorRecord, b: &ErrorRecord) -> bool {
    a.message == b.message
        && a.error_type == b.error_type
        && within_window(a.timestamp, b.timestamp)
}

pub(crate) fn within_window(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).num_milliseconds().abs() < DUPLICATE_WINDOW_MS
}
