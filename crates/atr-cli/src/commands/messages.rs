use atr_core::{ErrorType, messages::user_message};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
struct MessageRow {
    #[serde(rename = "type")]
    error_type: ErrorType,
    message: &'static str,
}

/// Handle `atr messages`.
pub fn handle(flags: &GlobalFlags) -> anyhow::Result<()> {
    let rows: Vec<MessageRow> = ErrorType::ALL
        .into_iter()
        .map(|error_type| MessageRow {
            error_type,
            message: user_message(error_type),
        })
        .collect();
    output(&rows, flags.format)
}
