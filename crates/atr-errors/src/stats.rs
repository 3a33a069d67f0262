//! Aggregate statistics over a list of records.
//!
//! Input is expected in store order (oldest first), so the newest record is
//! the last element and the oldest still-held record is the first.

use atr_core::{ErrorRecord, ErrorType, Severity};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub count: usize,
    /// Share of the total, rounded to the nearest integer.
    pub percentage: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: usize,
    pub percentage: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub total: usize,
    /// Present types only, in taxonomy order.
    pub by_type: Vec<TypeCount>,
    /// Present severities only, lowest first.
    pub by_severity: Vec<SeverityCount>,
    pub most_recent: Option<ErrorRecord>,
    pub oldest_unresolved: Option<ErrorRecord>,
}

#[must_use]
pub fn summarize(records: &[ErrorRecord]) -> ErrorSummary {
    let total = records.len();
    let by_type = ErrorType::ALL
        .into_iter()
        .filter_map(|error_type| {
            let count = records.iter().filter(|r| r.error_type == error_type).count();
            (count > 0).then(|| TypeCount {
                error_type,
                count,
                percentage: percentage(count, total),
            })
        })
        .collect();
    let by_severity = Severity::ALL
        .into_iter()
        .filter_map(|severity| {
            let count = records.iter().filter(|r| r.severity == severity).count();
            (count > 0).then(|| SeverityCount {
                severity,
                count,
                percentage: percentage(count, total),
            })
        })
        .collect();

    ErrorSummary {
        total,
        by_type,
        by_severity,
        most_recent: records.last().cloned(),
        oldest_unresolved: records.first().cloned(),
    }
}

/// `round(100 * count / total)` with halves rounded up.
const fn percentage(count: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    (200 * count + total) / (2 * total)
}
