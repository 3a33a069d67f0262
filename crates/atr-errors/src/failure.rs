//! Raw failure shapes produced by collaborators.
//!
//! Screens and the HTTP client hand over whatever went wrong: a rejected call
//! that carries a response, a call that never got one, a validation failure,
//! or some other caught error. [`RawFailure`] models those as a tagged union
//! with capability checks (`response()`, `is_connectivity_failure()`,
//! `is_validation()`) that the classifier runs in priority order.

use atr_core::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Failure codes that mark a request which never reached the server.
const NETWORK_ERROR_CODES: &[&str] = &[
    "ERR_NETWORK",
    "ECONNREFUSED",
    "ECONNRESET",
    "ECONNABORTED",
    "ETIMEDOUT",
    "ENOTFOUND",
    "EAI_AGAIN",
];

/// Lowercase message fragments that mean the same thing as a network code.
const CONNECTION_FAILURE_PHRASES: &[&str] = &[
    "network error",
    "failed to fetch",
    "connection refused",
    "connection reset",
    "connection closed",
    "error sending request",
];

/// Name that marks a caught error as a validation failure.
const VALIDATION_ERROR_NAME: &str = "ValidationError";

/// The response half of a rejected HTTP call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    /// Response payload, parsed as JSON when possible.
    pub data: Option<Value>,
}

/// The request half of a rejected HTTP call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub url: Option<String>,
    pub method: Option<String>,
}

/// A failure as handed to the error subsystem, before classification.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RawFailure {
    /// An HTTP call completed with a failing response.
    #[error("{message}")]
    Response {
        response: ResponseInfo,
        request: Option<RequestInfo>,
        message: String,
    },

    /// An HTTP call that produced no response at all.
    #[error("{message}")]
    Transport {
        request: Option<RequestInfo>,
        message: String,
        code: Option<String>,
    },

    /// Application-level input validation failed.
    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
        value: Option<Value>,
    },

    /// Any other caught error.
    #[error("{message}")]
    Exception {
        name: Option<String>,
        message: String,
        code: Option<ErrorCode>,
        stack: Option<String>,
    },
}

impl RawFailure {
    /// A rejected call with the given HTTP status.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::Response {
            response: ResponseInfo {
                status: Some(status),
                ..ResponseInfo::default()
            },
            request: None,
            message: format!("Request failed with status code {status}"),
        }
    }

    /// A call that failed before any response arrived.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Transport {
            request: None,
            message: message.into(),
            code: Some("ERR_NETWORK".to_string()),
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
            value: None,
        }
    }

    /// A plain caught error with no extra shape.
    #[must_use]
    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception {
            name: None,
            message: message.into(),
            code: None,
            stack: None,
        }
    }

    /// Capture any error value, keeping its source chain as the stack text.
    #[must_use]
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self::Exception {
            name: None,
            message: error.to_string(),
            code: None,
            stack: chain_text(&causes),
        }
    }

    /// Attach request context to an HTTP-shaped failure. No-op for other shapes.
    #[must_use]
    pub fn with_request(mut self, info: RequestInfo) -> Self {
        if let Self::Response { request, .. } | Self::Transport { request, .. } = &mut self {
            *request = Some(info);
        }
        self
    }

    // -- capability checks ---------------------------------------------------

    /// The response descriptor, if the failure carries one.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseInfo> {
        match self {
            Self::Response { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The request descriptor, if the failure carries one.
    #[must_use]
    pub const fn request(&self) -> Option<&RequestInfo> {
        match self {
            Self::Response { request, .. } | Self::Transport { request, .. } => request.as_ref(),
            _ => None,
        }
    }

    /// HTTP status of the response, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        self.response().and_then(|r| r.status)
    }

    /// True when no response is present and the failure signals lost connectivity,
    /// either through a network code or a connection-failure message.
    #[must_use]
    pub fn is_connectivity_failure(&self) -> bool {
        match self {
            Self::Response { .. } | Self::Validation { .. } => false,
            Self::Transport { code, message, .. } => {
                code.as_deref().is_some_and(is_network_code) || mentions_connection_failure(message)
            }
            Self::Exception { code, message, .. } => {
                matches!(code, Some(ErrorCode::Named(name)) if is_network_code(name))
                    || mentions_connection_failure(message)
            }
        }
    }

    /// True for validation failures, including caught errors named `ValidationError`.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation { .. } => true,
            Self::Exception { name, .. } => name.as_deref() == Some(VALIDATION_ERROR_NAME),
            _ => false,
        }
    }

    /// True when the failure looks like it came out of an API call.
    #[must_use]
    pub fn has_api_shape(&self) -> bool {
        self.response().is_some() || self.is_connectivity_failure()
    }

    // -- accessors -----------------------------------------------------------

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Response { message, .. }
            | Self::Transport { message, .. }
            | Self::Validation { message, .. }
            | Self::Exception { message, .. } => message,
        }
    }

    /// Machine code: the HTTP status for responses, the failure code otherwise.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Response { response, .. } => response.status.map(ErrorCode::Status),
            Self::Transport { code, .. } => code.clone().map(ErrorCode::Named),
            Self::Exception { code, .. } => code.clone(),
            Self::Validation { .. } => None,
        }
    }

    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Exception { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }

    /// Structured context for display and logging.
    ///
    /// HTTP failures expose `url`, `method`, `status`, `statusText` and `data`;
    /// validation failures expose `field` and `value`. Absent parts are omitted.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        let mut map = Map::new();
        if let Some(request) = self.request() {
            insert_some(&mut map, "url", request.url.clone().map(Value::String));
            insert_some(&mut map, "method", request.method.clone().map(Value::String));
        }
        match self {
            Self::Response { response, .. } => {
                insert_some(&mut map, "status", response.status.map(Value::from));
                insert_some(
                    &mut map,
                    "statusText",
                    response.status_text.clone().map(Value::String),
                );
                insert_some(&mut map, "data", response.data.clone());
            }
            Self::Validation { field, value, .. } => {
                return Some(json!({ "field": field, "value": value }));
            }
            Self::Exception { name, .. } => {
                insert_some(&mut map, "name", name.clone().map(Value::String));
            }
            Self::Transport { .. } => {}
        }
        (!map.is_empty()).then_some(Value::Object(map))
    }
}

impl From<&str> for RawFailure {
    fn from(message: &str) -> Self {
        Self::exception(message)
    }
}

impl From<String> for RawFailure {
    fn from(message: String) -> Self {
        Self::exception(message)
    }
}

impl From<anyhow::Error> for RawFailure {
    fn from(error: anyhow::Error) -> Self {
        let error = match error.downcast::<Self>() {
            Ok(failure) => return failure,
            Err(error) => error,
        };
        let error = match error.downcast::<reqwest::Error>() {
            Ok(error) => return error.into(),
            Err(error) => error,
        };
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        Self::Exception {
            name: None,
            message: error.to_string(),
            code: None,
            stack: chain_text(&causes),
        }
    }
}

fn is_network_code(code: &str) -> bool {
    NETWORK_ERROR_CODES.contains(&code)
}

fn mentions_connection_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    CONNECTION_FAILURE_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

fn chain_text(causes: &[String]) -> Option<String> {
    if causes.is_empty() {
        return None;
    }
    Some(
        causes
            .iter()
            .map(|cause| format!("caused by: {cause}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn insert_some(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, thiserror::Error)]
    #[error("tenant sync failed")]
    struct SyncError {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn status_constructor_sets_axios_style_message() {
        let failure = RawFailure::status(404);
        assert_eq!(failure.message(), "Request failed with status code 404");
        assert_eq!(failure.http_status(), Some(404));
        assert_eq!(failure.code(), Some(ErrorCode::Status(404)));
    }

    #[test]
    fn connectivity_detected_from_code() {
        let failure = RawFailure::Transport {
            request: None,
            message: "socket hang up".into(),
            code: Some("ECONNRESET".into()),
        };
        assert!(failure.is_connectivity_failure());
        assert!(failure.has_api_shape());
    }

    #[test]
    fn connectivity_detected_from_message() {
        assert!(RawFailure::exception("Network Error").is_connectivity_failure());
        assert!(RawFailure::exception("TypeError: Failed to fetch").is_connectivity_failure());
        assert!(!RawFailure::exception("undefined is not a function").is_connectivity_failure());
    }

    #[test]
    fn responses_are_never_connectivity_failures() {
        let failure = RawFailure::Response {
            response: ResponseInfo::default(),
            request: None,
            message: "Network Error".into(),
        };
        assert!(!failure.is_connectivity_failure());
        assert!(failure.has_api_shape());
    }

    #[test]
    fn validation_by_variant_or_name() {
        assert!(RawFailure::validation("email", "Email is required").is_validation());
        let named = RawFailure::Exception {
            name: Some("ValidationError".into()),
            message: "bad slug".into(),
            code: None,
            stack: None,
        };
        assert!(named.is_validation());
        assert!(!RawFailure::exception("bad slug").is_validation());
    }

    #[test]
    fn details_from_request_and_response() {
        let failure = RawFailure::Response {
            response: ResponseInfo {
                status: Some(422),
                status_text: Some("Unprocessable Entity".into()),
                data: Some(json!({ "errors": ["name taken"] })),
            },
            request: Some(RequestInfo {
                url: Some("/api/products".into()),
                method: Some("POST".into()),
            }),
            message: "Request failed with status code 422".into(),
        };
        assert_eq!(
            failure.details(),
            Some(json!({
                "url": "/api/products",
                "method": "POST",
                "status": 422,
                "statusText": "Unprocessable Entity",
                "data": { "errors": ["name taken"] }
            }))
        );
    }

    #[test]
    fn details_absent_for_bare_exception() {
        assert_eq!(RawFailure::exception("boom").details(), None);
    }

    #[test]
    fn with_request_only_touches_http_shapes() {
        let info = RequestInfo {
            url: Some("/api/roles".into()),
            method: Some("DELETE".into()),
        };
        let failure = RawFailure::status(500).with_request(info.clone());
        assert_eq!(failure.request(), Some(&info));
        let failure = RawFailure::exception("boom").with_request(info);
        assert_eq!(failure.request(), None);
    }

    #[test]
    fn from_error_keeps_source_chain() {
        let error = SyncError {
            source: std::io::Error::other("disk full"),
        };
        let failure = RawFailure::from_error(&error);
        assert_eq!(failure.message(), "tenant sync failed");
        assert_eq!(failure.stack(), Some("caused by: disk full"));
    }

    #[test]
    fn anyhow_downcasts_to_raw_failure() {
        let error = anyhow::Error::new(RawFailure::status(401));
        assert_eq!(RawFailure::from(error), RawFailure::status(401));
    }

    #[test]
    fn anyhow_context_becomes_exception_with_stack() {
        let error = anyhow::anyhow!("connection pool empty").context("loading tenants");
        let failure = RawFailure::from(error);
        assert_eq!(failure.message(), "loading tenants");
        assert_eq!(failure.stack(), Some("caused by: connection pool empty"));
    }
}
