use std::time::Duration;

use atr_config::{AtriumConfig, RetryConfig};
use atr_errors::{ErrorHandler, ErrorView, RawFailure, RetryPolicy, check_response_for};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CheckArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CheckResponse<'a> {
    url: &'a str,
    body: Value,
}

/// Handle `atr check`.
pub async fn handle(
    args: &CheckArgs,
    config: &AtriumConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let policy = policy_for(args, &config.retry);
    let handler = ErrorHandler::from_config(config).with_retry_policy(policy);
    let client = reqwest::Client::new();
    let url = args.url.as_str();

    tracing::debug!(
        url,
        max_attempts = policy.max_attempts,
        delay_ms = config.retry.delay_ms,
        "checking endpoint"
    );

    if let Some(body) = handler.retry_default(|| fetch(&client, url)).await {
        let body = serde_json::from_str(&body).unwrap_or(Value::String(body));
        return output(&CheckResponse { url, body }, flags.format);
    }

    let recorded = handler.store().errors();
    if let Some(record) = recorded.last() {
        output(&ErrorView::with_details(record), flags.format)?;
    }
    anyhow::bail!(
        "request to {url} failed after {} attempt(s)",
        policy.max_attempts.max(1)
    )
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, RawFailure> {
    let resp = client.get(url).send().await?;
    let resp = check_response_for(Some(&Method::GET), resp).await?;
    Ok(resp.text().await?)
}

fn policy_for(args: &CheckArgs, config: &RetryConfig) -> RetryPolicy {
    RetryPolicy::new(
        args.attempts.unwrap_or(config.max_attempts),
        args.delay_ms.map_or_else(|| config.delay(), Duration::from_millis),
    )
}
