//! Common utilities shared by the HTTP implementations.

use crate::error::{ClientError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build an HTTP client with the configured request timeout.
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Join a base URL and an endpoint path without doubling slashes.
#[must_use]
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Extract the human-readable `detail` from an error body.
///
/// String details are returned verbatim; structured details (for example a
/// list of field errors) are returned as compact JSON. Returns `None` when
/// the body is not JSON or has no `detail`.
#[must_use]
pub fn detail_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Turn a non-success response into `ClientError::Api`, passing through success.
pub async fn check_status(
    response: Response,
    endpoint: &str,
    fallback_detail: &str,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = detail_from_body(&body).unwrap_or_else(|| fallback_detail.to_string());
    tracing::debug!(endpoint, status = status.as_u16(), %detail, "backend rejected request");

    Err(ClientError::Api {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        detail,
    })
}

/// Decode a JSON body, reporting failures against the endpoint.
pub async fn parse_json<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
    response.json().await.map_err(|e| ClientError::Parse {
        endpoint: endpoint.to_string(),
        message: format!("failed to parse response: {e}"),
    })
}
