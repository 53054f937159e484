//! Sending a routed request, directly or through the CORS relay.
//!
//! The relay accepts `POST {url, method, headers, body}` and answers with the
//! upstream response, so both paths share the response handling below.

use std::time::Instant;

use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use restbench_types::{RequestAssembly, RequestConfig};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::redact_sensitive;

/// Transport failures. HTTP error statuses are not errors; they come back as
/// a [`DispatchOutcome`] with `ok == false`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unsupported HTTP method '{0}'")]
    Method(String),
    #[error("invalid header '{name}'")]
    Header { name: String },
    #[error("Request timeout after {0}ms")]
    Timeout(u128),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Network error: {0}. Hint: check the endpoint, your connection and, in relay mode, that the relay is running")]
    Network(#[source] reqwest::Error),
}

/// Response of a dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON when the body is JSON, the raw text otherwise
    pub data: Value,
    pub headers: IndexMap<String, String>,
    pub duration_ms: u128,
}

fn sends_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Builds the outgoing header list: `Accept`, `Content-Type` for body-carrying
/// methods with a non-empty body, then the routed headers (which win).
pub fn outgoing_headers(method: &Method, assembly: &RequestAssembly, config: &RequestConfig) -> IndexMap<String, String> {
    let mut headers = IndexMap::new();
    headers.insert("Accept".to_string(), config.accept.clone());
    if sends_body(method) && assembly.has_body() {
        headers.insert("Content-Type".to_string(), config.content_type.clone());
    }
    for (name, value) in &assembly.headers {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
    headers
}

fn to_header_map(headers: &IndexMap<String, String>) -> Result<HeaderMap, DispatchError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || DispatchError::Header { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Sends `assembly` with `method` according to `config` and reads the full
/// response.
///
/// # Errors
/// Invalid method or header names, client construction failures, timeouts
/// and network errors.
pub async fn dispatch(
    method: &str,
    assembly: &RequestAssembly,
    config: &RequestConfig,
) -> Result<DispatchOutcome, DispatchError> {
    let method =
        Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| DispatchError::Method(method.to_string()))?;
    let headers = outgoing_headers(&method, assembly, config);
    let body = sends_body(&method).then(|| Value::Object(assembly.body.clone()));

    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(DispatchError::Client)?;

    let request = if config.use_proxy {
        client.post(&config.proxy_url).json(&json!({
            "url": assembly.final_endpoint,
            "method": method.as_str(),
            "headers": headers,
            "body": body,
        }))
    } else {
        let mut builder = client
            .request(method.clone(), &assembly.final_endpoint)
            .headers(to_header_map(&headers)?);
        if let Some(body) = &body {
            builder = builder.body(body.to_string());
        }
        builder
    };

    debug!(
        method = %method,
        url = %redact_sensitive(&assembly.final_endpoint),
        via_proxy = config.use_proxy,
        "http request started"
    );
    let start = Instant::now();
    let response = request.send().await.map_err(|error| classify(error, config))?;

    let status = response.status();
    let response_headers: IndexMap<String, String> = response
        .headers()
        .iter()
        .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect();
    let text = response.text().await.map_err(|error| classify(error, config))?;
    let duration = start.elapsed();

    let data = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    if !status.is_success() {
        warn!(method = %method, status = status.as_u16(), duration_ms = duration.as_millis(), "http request failed");
    } else {
        debug!(method = %method, status = status.as_u16(), duration_ms = duration.as_millis(), "http request completed");
    }

    Ok(DispatchOutcome {
        ok: status.is_success(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        data,
        headers: response_headers,
        duration_ms: duration.as_millis(),
    })
}

fn classify(error: reqwest::Error, config: &RequestConfig) -> DispatchError {
    if error.is_timeout() {
        DispatchError::Timeout(config.timeout.as_millis())
    } else {
        DispatchError::Network(error)
    }
}
