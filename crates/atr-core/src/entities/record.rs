use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ErrorCode, ErrorType, Severity};
use crate::errors::CoreError;
use crate::messages::user_message;

/// A classified failure, as held by the error store.
///
/// Records are immutable once created. The store is the only place that
/// assigns `id` and `timestamp`; everything else reads them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ErrorRecord {
    pub id: String,
    #[serde(rename = "type", default)]
    pub error_type: ErrorType,
    #[serde(default)]
    pub severity: Severity,
    pub message: String,
    /// Creation instant, millisecond precision.
    #[serde(with = "iso_millis")]
    #[schemars(with = "DateTime<Utc>")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Free-form context. A present `null` stays `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<serde_json::Value>")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorRecord {
    /// The fixed non-technical message for this record's type.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        user_message(self.error_type)
    }

    /// Encode as compact JSON with an ISO-8601 millisecond timestamp.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if `details` cannot be encoded.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a record produced by [`to_json`](Self::to_json).
    ///
    /// Returns `None` for malformed JSON, missing required fields, or a
    /// record with an empty `id` or `message`. Never panics.
    #[must_use]
    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str::<Self>(text)
            .ok()
            .filter(|record| !record.id.is_empty() && !record.message.trim().is_empty())
    }
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// ISO-8601 timestamps with exactly three fractional digits and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(3))
            .map_err(D::Error::custom)
    }
}
