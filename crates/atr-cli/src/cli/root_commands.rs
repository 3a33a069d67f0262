use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Classify a failure and show what the user would see.
    Classify(ClassifyArgs),
    /// Print the user-facing message for every error type.
    Messages,
    /// Summarize a file of serialized error records, one per line.
    Inspect(InspectArgs),
    /// GET a URL through the retry facade.
    Check(CheckArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ClassifyArgs {
    /// HTTP status the call failed with.
    #[arg(long, conflicts_with_all = ["network", "validation"])]
    pub status: Option<u16>,

    /// The call never got a response.
    #[arg(long, conflicts_with = "validation")]
    pub network: bool,

    /// Input validation failed.
    #[arg(long)]
    pub validation: bool,

    /// Failure message.
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct InspectArgs {
    /// File with one JSON error record per line.
    pub file: PathBuf,

    /// Also list every record with its technical details.
    #[arg(long)]
    pub details: bool,
}

#[derive(Clone, Debug, Args)]
pub struct CheckArgs {
    pub url: String,

    /// Attempts including the first (defaults to `retry.max_attempts`).
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Base backoff in milliseconds (defaults to `retry.delay_ms`).
    #[arg(long)]
    pub delay_ms: Option<u64>,
}
