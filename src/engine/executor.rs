// Component execution: request construction and dispatch for one step

//! # Component Executor
//!
//! Builds the final URL, headers and body for one component from the merged
//! scope (running context + merged parameters), dispatches through the
//! injected [`HttpClient`] (buffered or streaming), and normalizes the
//! outcome into an [`ExecutionResult`].
//!
//! [`execute_component`] never returns an error: invalid form templates,
//! transport failures and HTTP error statuses all fold into
//! `ExecutionResult { success: false, error, duration }` so the
//! orchestrator's retry loop can treat every failure uniformly.

use std::collections::HashMap;
use std::time::Instant;

use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use super::params::merge_parameters;
use super::sse::SseAccumulator;
use super::template::{interpolate_json, interpolate_string};
use super::Context;
use crate::http::{FormDataEntry, HttpClient, HttpRequest};
use crate::models::{BodyType, Component, ExecutionResult, HttpMethod};
use crate::{OmniflowError, Result};

/// Callback receiving the full accumulated text after each streamed chunk
pub type StreamSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Execute one component against the given context
///
/// `inputs` are the caller-supplied parameter values for this step;
/// `context` is the shared pipeline context. Streaming is used only when
/// the component's config sets `stream: true` *and* `on_stream` is
/// supplied; otherwise the call is buffered.
pub async fn execute_component(
    client: &dyn HttpClient,
    component: &Component,
    inputs: &Context,
    context: &Context,
    on_stream: Option<StreamSink<'_>>,
) -> ExecutionResult {
    let started = Instant::now();
    match dispatch(client, component, inputs, context, on_stream).await {
        Ok((data, headers)) => ExecutionResult {
            success: true,
            data: Some(data),
            error: None,
            duration: started.elapsed().as_millis() as u64,
            headers,
        },
        Err(e) => {
            debug!(component = %component.id, "component execution failed: {e}");
            ExecutionResult::failure(e.to_string(), started.elapsed().as_millis() as u64)
        }
    }
}

async fn dispatch(
    client: &dyn HttpClient,
    component: &Component,
    inputs: &Context,
    context: &Context,
    on_stream: Option<StreamSink<'_>>,
) -> Result<(Value, Option<HashMap<String, String>>)> {
    let config = &component.api_config;

    // Merged scope: running context first, this step's parameters win
    let mut scope = context.clone();
    scope.extend(merge_parameters(component, inputs));

    let url = interpolate_string(&config.url, &scope);
    let mut headers = HashMap::new();
    for header in &config.headers {
        if !header.key.is_empty() {
            headers.insert(header.key.clone(), interpolate_string(&header.value, &scope));
        }
    }

    let body = build_body(component, &scope, &mut headers)?;
    let request = HttpRequest {
        method: config.method,
        url,
        headers,
        body,
    };

    match on_stream {
        Some(sink) if config.stream == Some(true) => {
            let data = dispatch_streaming(client, request, sink).await?;
            Ok((data, None))
        }
        _ => dispatch_buffered(client, request).await,
    }
}

/// Build the wire body; GET never sends one regardless of configured type
fn build_body(
    component: &Component,
    scope: &Context,
    headers: &mut HashMap<String, String>,
) -> Result<String> {
    let config = &component.api_config;
    if config.method == HttpMethod::GET {
        return Ok(String::new());
    }

    let template = match &config.body_template {
        Some(t) => t.as_str(),
        None => return Ok(String::new()),
    };

    match config.body_type {
        BodyType::Json => Ok(interpolate_json(template, scope)),
        BodyType::FormData => {
            let parsed: Value = serde_json::from_str(template).map_err(|_| {
                OmniflowError::InvalidRequest("Invalid form data configuration".to_string())
            })?;
            // A valid document that is not an array yields zero entries
            let entries: Vec<FormDataEntry> = match parsed {
                Value::Array(_) => serde_json::from_value(parsed).map_err(|_| {
                    OmniflowError::InvalidRequest("Invalid form data configuration".to_string())
                })?,
                _ => Vec::new(),
            };
            let interpolated: Vec<FormDataEntry> = entries
                .into_iter()
                .map(|entry| FormDataEntry {
                    key: entry.key,
                    value: interpolate_string(&entry.value, scope),
                })
                .collect();
            // The serialized entry array is the wire body; actual multipart
            // encoding happens in the HttpClient implementation.
            headers.insert(
                "Content-Type".to_string(),
                "multipart/form-data".to_string(),
            );
            Ok(serde_json::to_string(&interpolated)?)
        }
        BodyType::None => Ok(String::new()),
    }
}

/// Parse a response body as JSON when it looks like JSON, keep the raw text
/// otherwise. Parse failures are tolerated.
fn sniff_json(text: &str) -> Value {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

async fn dispatch_buffered(
    client: &dyn HttpClient,
    request: HttpRequest,
) -> Result<(Value, Option<HashMap<String, String>>)> {
    let response = client.send(request).await?;
    let data = sniff_json(&response.body);

    if response.status >= 400 {
        let message = match &data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(OmniflowError::HttpStatus {
            status: response.status,
            message,
        });
    }

    Ok((data, Some(response.headers)))
}

async fn dispatch_streaming(
    client: &dyn HttpClient,
    request: HttpRequest,
    on_stream: StreamSink<'_>,
) -> Result<Value> {
    let mut stream = client.send_streaming(request).await?;
    let mut raw = String::new();
    let mut sse = SseAccumulator::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        raw.push_str(&chunk);
        if sse.push_chunk(&chunk) {
            // Each emission carries the full running text, not the delta
            (*on_stream)(sse.text());
        } else if !sse.is_sse() {
            (*on_stream)(&raw);
        }
    }

    if sse.text().is_empty() {
        Ok(sniff_json(&raw))
    } else {
        Ok(Value::String(sse.text().to_string()))
    }
}
