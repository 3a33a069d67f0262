//! Bridges from `reqwest` into [`RawFailure`].

use reqwest::Method;
use serde_json::Value;

use crate::failure::{RawFailure, RequestInfo, ResponseInfo};

/// Pass successful responses through; turn anything else into
/// [`RawFailure::Response`] carrying the status, reason phrase, body and URL.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, RawFailure> {
    check_response_for(None, resp).await
}

/// Like [`check_response`], also recording the request method.
pub async fn check_response_for(
    method: Option<&Method>,
    resp: reqwest::Response,
) -> Result<reqwest::Response, RawFailure> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let request = RequestInfo {
        url: Some(resp.url().to_string()),
        method: method.map(ToString::to_string),
    };
    let body = resp.text().await.unwrap_or_default();
    Err(RawFailure::Response {
        response: ResponseInfo {
            status: Some(status.as_u16()),
            status_text: status.canonical_reason().map(str::to_string),
            data: parse_body(&body),
        },
        request: Some(request),
        message: format!("Request failed with status code {}", status.as_u16()),
    })
}

/// JSON when the body parses, the raw text otherwise, nothing when empty.
fn parse_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

impl From<reqwest::Error> for RawFailure {
    fn from(error: reqwest::Error) -> Self {
        let request = error.url().map(|url| RequestInfo {
            url: Some(url.to_string()),
            method: None,
        });

        if let Some(status) = error.status() {
            let failure = Self::Response {
                response: ResponseInfo {
                    status: Some(status.as_u16()),
                    status_text: status.canonical_reason().map(str::to_string),
                    data: None,
                },
                request: None,
                message: format!("Request failed with status code {}", status.as_u16()),
            };
            return match request {
                Some(info) => failure.with_request(info),
                None => failure,
            };
        }

        let code = if error.is_timeout() {
            Some("ETIMEDOUT".to_string())
        } else if error.is_connect() {
            Some("ERR_NETWORK".to_string())
        } else {
            None
        };
        Self::Transport {
            request,
            message: error.to_string(),
            code,
        }
    }
}
