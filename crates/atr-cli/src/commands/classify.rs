use atr_core::{ErrorCode, ErrorType, Severity, messages::user_message};
use atr_errors::{Classification, RawFailure, ResponseInfo, classify};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ClassifyArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    #[serde(rename = "type")]
    error_type: ErrorType,
    severity: Severity,
    user_message: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
}

/// Handle `atr classify`.
pub fn handle(args: &ClassifyArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let failure = failure_from_args(args);
    let Classification {
        error_type,
        severity,
    } = classify(&failure);
    let response = ClassifyResponse {
        error_type,
        severity,
        user_message: user_message(error_type),
        message: failure.message().to_string(),
        code: failure.code(),
    };
    output(&response, flags.format)
}

fn failure_from_args(args: &ClassifyArgs) -> RawFailure {
    let message = args.message.clone();
    if let Some(status) = args.status {
        return match message {
            Some(message) => RawFailure::Response {
                response: ResponseInfo {
                    status: Some(status),
                    ..ResponseInfo::default()
                },
                request: None,
                message,
            },
            None => RawFailure::status(status),
        };
    }
    if args.network {
        return RawFailure::network(message.unwrap_or_else(|| "Network Error".to_string()));
    }
    if args.validation {
        return RawFailure::validation("input", message.unwrap_or_else(|| "Invalid input".into()));
    }
    RawFailure::exception(message.unwrap_or_else(|| "Unexpected failure".to_string()))
}
