// Production HttpClient backed by reqwest

//! # Reqwest Client
//!
//! Buffered and streaming dispatch over [`reqwest`], with the request
//! preparation the engine's wire contract expects:
//!
//! - a `Content-Type: multipart/form-data` header switches the body into
//!   multipart mode: the body text is parsed as a JSON array of
//!   [`FormDataEntry`] values, `data:` URIs become file parts, everything
//!   else becomes text fields, and reqwest supplies the boundary
//! - binary response bodies (images, audio, PDF, octet-stream) are
//!   re-encoded as `data:<mime>;base64,` URIs so they survive the text-only
//!   response contract
//! - streaming requests fail fast on HTTP >= 400 with the error page as the
//!   message

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{ChunkStream, FormDataEntry, HttpClient, HttpRequest, HttpResponse};
use crate::models::HttpMethod;
use crate::{OmniflowError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Production HTTP transport
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    fn prepare(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder> {
        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
        };

        let multipart = request
            .headers
            .iter()
            .any(|(k, v)| {
                k.eq_ignore_ascii_case("content-type")
                    && v.to_ascii_lowercase().contains("multipart/form-data")
            });

        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            // reqwest sets the multipart Content-Type itself, boundary included
            if multipart && key.eq_ignore_ascii_case("content-type") {
                continue;
            }
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| OmniflowError::InvalidRequest(format!("Invalid header key: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| OmniflowError::InvalidRequest(format!("Invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = self.client.request(method, &request.url).headers(headers);

        if multipart {
            builder = builder.multipart(build_form(&request.body)?);
        } else if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        Ok(builder)
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand the JSON entry array into a multipart form
fn build_form(body: &str) -> Result<reqwest::multipart::Form> {
    let entries: Vec<FormDataEntry> = serde_json::from_str(body)
        .map_err(|e| OmniflowError::InvalidRequest(format!("Failed to parse form data: {e}")))?;

    let mut form = reqwest::multipart::Form::new();
    for entry in entries {
        match split_data_uri(&entry.value) {
            Some((mime, payload)) => {
                let bytes = general_purpose::STANDARD.decode(payload).map_err(|e| {
                    OmniflowError::InvalidRequest(format!("Invalid base64 file field: {e}"))
                })?;
                let filename = format!("file_{}.{}", entry.key, extension_for(&mime));
                let part = reqwest::multipart::Part::bytes(bytes)
                    .file_name(filename)
                    .mime_str(&mime)
                    .map_err(|e| {
                        OmniflowError::InvalidRequest(format!("Invalid mime type: {e}"))
                    })?;
                form = form.part(entry.key, part);
            }
            None => {
                form = form.text(entry.key, entry.value);
            }
        }
    }
    Ok(form)
}

/// Split a `data:<mime>;base64,<payload>` URI into mime type and payload
fn split_data_uri(value: &str) -> Option<(String, &str)> {
    let rest = value.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(";base64,")?;
    let mime = if meta.is_empty() {
        "application/octet-stream".to_string()
    } else {
        meta.to_string()
    };
    Some((mime, payload))
}

fn extension_for(mime: &str) -> &str {
    mime.rsplit_once('/').map(|(_, ext)| ext).unwrap_or("bin")
}

/// Content types whose bodies are re-encoded as data URIs
fn is_binary_content(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ["image", "audio", "video", "pdf", "octet-stream"]
        .iter()
        .any(|kind| ct.contains(kind))
}

fn header_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut out: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let text = value.to_str().unwrap_or_default().to_string();
        out.entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&text);
            })
            .or_insert(text);
    }
    out
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .prepare(&request)?
            .send()
            .await
            .map_err(|e| OmniflowError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        let headers = header_map(response.headers());
        let content_type = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.clone())
            .unwrap_or_default();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| OmniflowError::Network(e.to_string()))?;

        let body = if is_binary_content(&content_type) {
            format!(
                "data:{};base64,{}",
                content_type,
                general_purpose::STANDARD.encode(&bytes)
            )
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        debug!(url = %request.url, status, "buffered request completed");
        Ok(HttpResponse {
            status,
            status_text,
            headers,
            body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<ChunkStream> {
        let response = self
            .prepare(&request)?
            .send()
            .await
            .map_err(|e| OmniflowError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(OmniflowError::HttpStatus {
                status,
                message: body,
            });
        }

        debug!(url = %request.url, status, "streaming response opened");
        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(|e| OmniflowError::Network(e.to_string()))
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_data_uri() {
        let (mime, payload) = split_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(payload, "aGVsbG8=");

        assert!(split_data_uri("plain text").is_none());
        assert!(split_data_uri("data:text/plain,not-base64").is_none());
    }

    #[test]
    fn test_split_data_uri_defaults_mime() {
        let (mime, _) = split_data_uri("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(mime, "application/octet-stream");
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("weird"), "bin");
    }

    #[test]
    fn test_is_binary_content() {
        assert!(is_binary_content("image/png"));
        assert!(is_binary_content("application/pdf"));
        assert!(is_binary_content("application/octet-stream; charset=x"));
        assert!(!is_binary_content("application/json"));
        assert!(!is_binary_content("text/event-stream"));
    }

    #[test]
    fn test_build_form_rejects_bad_json() {
        assert!(build_form("{not an array").is_err());
    }

    #[test]
    fn test_build_form_accepts_entries() {
        let body = r#"[{"key":"name","value":"Bob"},{"key":"file","value":"data:image/png;base64,aGVsbG8="}]"#;
        assert!(build_form(body).is_ok());
    }
}
