//! Bounded, observable error store.
//!
//! One [`ErrorStore`] is created per top-level scope (an application
//! instance, a test) and handed to every consumer; clones share the same
//! records. State lives in a `tokio::sync::watch` channel: every mutation runs
//! under the channel's lock and is visible to all receivers before the
//! mutating call returns, so interleaved `add_error` calls from independent
//! tasks are all reflected.
//!
//! Records are kept in insertion order, oldest first. When the store is full
//! the oldest record is evicted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use atr_config::ErrorsConfig;
use atr_core::ids::{self, PREFIX_ERROR};
use atr_core::messages::user_message;
use atr_core::{ErrorCode, ErrorRecord, ErrorType, Severity};
use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;
use tokio::sync::watch;

use crate::dedup::within_window;

/// Store capacity when none is configured.
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// A record before the store assigns its `id` and `timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewError {
    pub error_type: Option<ErrorType>,
    pub severity: Option<Severity>,
    pub message: String,
    pub code: Option<ErrorCode>,
    pub details: Option<Value>,
    pub stack: Option<String>,
}

impl NewError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = Some(error_type);
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Type after defaulting.
    #[must_use]
    pub fn resolved_type(&self) -> ErrorType {
        self.error_type.unwrap_or_default()
    }

    /// Message after defaulting: a blank message becomes the type's user message.
    #[must_use]
    pub fn resolved_message(&self) -> String {
        if self.message.trim().is_empty() {
            user_message(self.resolved_type()).to_string()
        } else {
            self.message.clone()
        }
    }

    fn into_record(self, id: String, timestamp: DateTime<Utc>) -> ErrorRecord {
        let message = self.resolved_message();
        ErrorRecord {
            id,
            error_type: self.resolved_type(),
            severity: self.severity.unwrap_or_default(),
            message,
            timestamp,
            code: self.code,
            details: self.details,
            stack: self.stack,
        }
    }
}

/// Shared handle to the bounded error list.
#[derive(Debug, Clone)]
pub struct ErrorStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    records: watch::Sender<VecDeque<ErrorRecord>>,
    max_errors: usize,
    /// Fallback ID source when the OS random source is unavailable.
    sequence: AtomicU32,
}

impl Default for ErrorStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

impl ErrorStore {
    /// Create a store holding at most `max_errors` records (at least one).
    #[must_use]
    pub fn new(max_errors: usize) -> Self {
        let (records, _) = watch::channel(VecDeque::new());
        Self {
            inner: Arc::new(Inner {
                records,
                max_errors: max_errors.max(1),
                sequence: AtomicU32::new(0),
            }),
        }
    }

    #[must_use]
    pub fn from_config(config: &ErrorsConfig) -> Self {
        Self::new(config.max_errors)
    }

    #[must_use]
    pub fn max_errors(&self) -> usize {
        self.inner.max_errors
    }

    // -- mutation -------------------------------------------------------------

    /// Append a record, evicting the oldest if the store is full.
    ///
    /// Assigns a fresh `id` (unique among held records) and a timestamp no
    /// earlier than the newest held record's. Returns the `id`.
    pub fn add_error(&self, new: NewError) -> String {
        let mut assigned = String::new();
        self.inner.records.send_modify(|records| {
            let id = self.fresh_id(records);
            let now = Utc::now().trunc_subsecs(3);
            let timestamp = records.back().map_or(now, |newest| now.max(newest.timestamp));
            records.push_back(new.into_record(id.clone(), timestamp));
            while records.len() > self.inner.max_errors {
                if let Some(evicted) = records.pop_front() {
                    tracing::debug!(id = %evicted.id, "error store full; evicted oldest record");
                }
            }
            assigned = id;
        });
        assigned
    }

    /// Remove the record with `id`. Absent IDs are ignored and observers are not woken.
    pub fn remove_error(&self, id: &str) {
        self.inner.records.send_if_modified(|records| {
            let before = records.len();
            records.retain(|record| record.id != id);
            records.len() != before
        });
    }

    pub fn clear_errors(&self) {
        self.inner.records.send_if_modified(|records| {
            let had_records = !records.is_empty();
            records.clear();
            had_records
        });
    }

    // -- queries --------------------------------------------------------------

    /// All records, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.inner.records.borrow().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.records.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<ErrorRecord> {
        self.inner
            .records
            .borrow()
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    #[must_use]
    pub fn errors_by_type(&self, error_type: ErrorType) -> Vec<ErrorRecord> {
        self.filtered(|record| record.error_type == error_type)
    }

    #[must_use]
    pub fn errors_by_severity(&self, severity: Severity) -> Vec<ErrorRecord> {
        self.filtered(|record| record.severity == severity)
    }

    /// Records created at or after `since`.
    #[must_use]
    pub fn errors_since(&self, since: DateTime<Utc>) -> Vec<ErrorRecord> {
        self.filtered(|record| record.timestamp >= since)
    }

    /// A held record that a report of `new` made now would duplicate.
    #[must_use]
    pub fn find_duplicate(&self, new: &NewError) -> Option<ErrorRecord> {
        let message = new.resolved_message();
        let error_type = new.resolved_type();
        let now = Utc::now();
        self.inner
            .records
            .borrow()
            .iter()
            .rev()
            .find(|record| {
                record.message == message
                    && record.error_type == error_type
                    && within_window(record.timestamp, now)
            })
            .cloned()
    }

    /// Observe the record list. The receiver is notified after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<VecDeque<ErrorRecord>> {
        self.inner.records.subscribe()
    }

    fn filtered(&self, keep: impl Fn(&ErrorRecord) -> bool) -> Vec<ErrorRecord> {
        self.inner
            .records
            .borrow()
            .iter()
            .filter(|record| keep(record))
            .cloned()
            .collect()
    }

    fn fresh_id(&self, held: &VecDeque<ErrorRecord>) -> String {
        loop {
            let id = ids::generate_id(PREFIX_ERROR).unwrap_or_else(|error| {
                tracing::warn!(%error, "random source unavailable; using sequential error id");
                let next = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
                ids::format_id(PREFIX_ERROR, next)
            });
            if !held.iter().any(|record| record.id == id) {
                return id;
            }
        }
    }
}
