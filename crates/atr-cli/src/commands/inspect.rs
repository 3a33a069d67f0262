use std::path::Path;

use anyhow::Context;
use atr_config::AtriumConfig;
use atr_core::ErrorRecord;
use atr_errors::{ErrorSummary, ErrorView, summarize};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InspectArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InspectResponse {
    read: usize,
    skipped: usize,
    summary: ErrorSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<ErrorView>>,
}

/// Handle `atr inspect`.
pub fn handle(
    args: &InspectArgs,
    config: &AtriumConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let (records, skipped) = load_records(&args.file)?;
    let read = records.len();
    let held = retained(&records, config.errors.max_errors);

    let response = InspectResponse {
        read,
        skipped,
        summary: summarize(held),
        records: args
            .details
            .then(|| held.iter().map(ErrorView::with_details).collect()),
    };
    output(&response, flags.format)
}

fn load_records(path: &Path) -> anyhow::Result<(Vec<ErrorRecord>, usize)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read error log at {}", path.display()))?;
    Ok(parse_records(&text))
}

/// Parse one record per non-empty line. Malformed lines are logged and counted.
fn parse_records(text: &str) -> (Vec<ErrorRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match ErrorRecord::from_json(line) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                tracing::warn!(line = index + 1, "skipping malformed error record");
            }
        }
    }
    (records, skipped)
}

/// The newest `max_errors` records, which is what a store of that size would hold.
fn retained(records: &[ErrorRecord], max_errors: usize) -> &[ErrorRecord] {
    &records[records.len().saturating_sub(max_errors.max(1))..]
}
