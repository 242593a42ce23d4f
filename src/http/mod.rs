// HTTP transport abstraction consumed by the execution engine

//! # HTTP Client Interface
//!
//! The engine never talks to the network directly; it dispatches through
//! this trait. [`ReqwestClient`] is the production implementation; tests
//! inject mocks. Two dispatch modes:
//!
//! - [`send`](HttpClient::send): buffered request/response, body as text
//! - [`send_streaming`](HttpClient::send_streaming): the response body as a
//!   stream of text chunks, failing fast on HTTP error statuses
//!
//! TLS, proxying and socket handling are implementation concerns; the
//! engine only sees these types.

mod reqwest_client;

pub use reqwest_client::ReqwestClient;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;

use crate::models::HttpMethod;
use crate::Result;

/// A fully interpolated outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Wire body text; for multipart requests this is the JSON-encoded
    /// array of [`FormDataEntry`] values the client expands
    pub body: String,
}

/// A buffered response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// One field of a multipart request as configured by a component
///
/// A `value` of the form `data:<mime>;base64,<payload>` is decoded and sent
/// as a file part; anything else is sent as a plain text field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormDataEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Stream of decoded text chunks from a streaming response
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Transport collaborator injected into the engine
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Buffered dispatch. Transport failures are `Err`; HTTP error statuses
    /// are returned as a normal [`HttpResponse`] for the engine to judge.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Streaming dispatch. Implementations should fail fast (return `Err`)
    /// when the response status is an error, since error pages are not
    /// streams worth decoding.
    async fn send_streaming(&self, request: HttpRequest) -> Result<ChunkStream>;
}
