//! Map a raw failure to `{type, severity}`.

use atr_core::{ErrorType, Severity};
use serde::Serialize;

use crate::failure::RawFailure;

/// The classifier's verdict for one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub severity: Severity,
}

impl Classification {
    #[must_use]
    pub const fn new(error_type: ErrorType, severity: Severity) -> Self {
        Self {
            error_type,
            severity,
        }
    }
}

/// Classify a raw failure. First matching rule wins:
///
/// | rule                                   | type           | severity |
/// |----------------------------------------|----------------|----------|
/// | status 401                             | authentication | high     |
/// | status 403                             | authorization  | high     |
/// | status 400..500                        | client         | medium   |
/// | status >= 500                          | server         | high     |
/// | response without a failing status      | network        | medium   |
/// | no response, connectivity marker       | network        | high     |
/// | validation failure                     | validation     | medium   |
/// | anything else                          | client         | medium   |
#[must_use]
pub fn classify(failure: &RawFailure) -> Classification {
    if let Some(response) = failure.response() {
        return match response.status {
            Some(401) => Classification::new(ErrorType::Authentication, Severity::High),
            Some(403) => Classification::new(ErrorType::Authorization, Severity::High),
            Some(400..=499) => Classification::new(ErrorType::Client, Severity::Medium),
            Some(500..) => Classification::new(ErrorType::Server, Severity::High),
            _ => Classification::new(ErrorType::Network, Severity::Medium),
        };
    }
    if failure.is_connectivity_failure() {
        return Classification::new(ErrorType::Network, Severity::High);
    }
    if failure.is_validation() {
        return Classification::new(ErrorType::Validation, Severity::Medium);
    }
    Classification::new(ErrorType::Client, Severity::Medium)
}
