//! What a card, toast or dialog needs to render one error.
//!
//! The default view shows only the non-technical title and the record's own
//! message. Code, details and stack are included only when the caller asks
//! for them.

use atr_core::{ErrorCode, ErrorRecord, ErrorType, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorView {
    pub id: String,
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub severity: Severity,
    /// Fixed user-facing message for the type.
    pub title: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical: Option<TechnicalDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorView {
    /// The default, user-facing view.
    #[must_use]
    pub fn summary(record: &ErrorRecord) -> Self {
        Self {
            id: record.id.clone(),
            error_type: record.error_type,
            severity: record.severity,
            title: record.user_message(),
            message: record.message.clone(),
            timestamp: record.timestamp,
            technical: None,
        }
    }

    /// The "show details" view. `technical` stays `None` if the record has nothing to show.
    #[must_use]
    pub fn with_details(record: &ErrorRecord) -> Self {
        let has_technical =
            record.code.is_some() || record.details.is_some() || record.stack.is_some();
        Self {
            technical: has_technical.then(|| TechnicalDetails {
                code: record.code.clone(),
                details: record.details.clone(),
                stack: record.stack.clone(),
            }),
            ..Self::summary(record)
        }
    }
}

impl From<&ErrorRecord> for ErrorView {
    fn from(record: &ErrorRecord) -> Self {
        Self::summary(record)
    }
}
