// Omniflow - Workflow Execution Engine
// A pipeline engine that chains HTTP API calls and threads their results
// through a {{path}} template language.

//! # Omniflow Library
//!
//! This is the main library crate for Omniflow, an execution engine for
//! user-assembled pipelines ("apps") of HTTP API calls ("components").
//!
//! ## Core Components
//!
//! - [`App`] / [`Component`]: Immutable pipeline definitions loaded from a
//!   repository at run start.
//! - Template subsystem ([`resolve_path`], [`interpolate_string`],
//!   [`interpolate_json`]): substitutes `{{path}}` references inside strings
//!   and structured JSON documents while preserving JSON types.
//! - [`execute_component`]: builds the final URL/headers/body for one
//!   component and dispatches it through an injected [`HttpClient`], buffered
//!   or streaming.
//! - [`WorkflowEngine`]: runs components strictly in declared order, merges
//!   per-step inputs with the running context, applies retry and
//!   continue-on-error policy, and reports step transitions over a channel.
//!
//! ## Collaborators
//!
//! The engine performs no I/O of its own. Network transport, app persistence
//! and environment settings are injected:
//!
//! - [`HttpClient`]: buffered and streaming request dispatch
//!   ([`ReqwestClient`] is the production implementation)
//! - [`AppRepository`] / [`SessionRepository`]: definition storage
//! - [`SettingsProvider`]: environment variables exposed to templates as
//!   `env.*`

pub mod engine;
pub mod http;
pub mod models;
pub mod settings;

// Re-export the main types for clean API access
pub use engine::executor::execute_component;
pub use engine::orchestrator::{StepStatus, StepUpdate, WorkflowEngine};
pub use engine::params::merge_parameters;
pub use engine::sse::SseAccumulator;
pub use engine::storage::{
    AppRepository, InMemoryAppRepository, InMemorySessionRepository, SessionRepository,
};
pub use engine::template::{interpolate_json, interpolate_string, resolve, resolve_path};
pub use engine::Context;
pub use http::{ChunkStream, FormDataEntry, HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use models::{
    ApiConfig, ApiHeader, App, AppRunMode, BodyType, Component, ExecutionResult, FlowControl,
    HttpMethod, ParamDefinition, ParamUiType, Session,
};
pub use settings::{InMemorySettings, ProcessEnvSettings, SettingsProvider};

use thiserror::Error;

/// Custom error types for Omniflow operations
///
/// Failures inside a running step never surface as these errors; the
/// executor folds every per-attempt failure into an [`ExecutionResult`] and
/// the orchestrator reports it as an `error` step update. `OmniflowError`
/// covers the paths around the run: definition loading, request
/// construction, and transport.
#[derive(Error, Debug)]
pub enum OmniflowError {
    /// An app definition could not be found in the repository
    #[error("App not found: {id}")]
    AppNotFound { id: String },

    /// A component definition failed validation
    #[error("Invalid component: {0}")]
    InvalidComponent(String),

    /// A request could not be constructed (bad header, bad form template)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with an error status
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Transport-level failure (connect, TLS, mid-stream abort)
    #[error("Network error: {0}")]
    Network(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage-related errors from repository implementations
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Convenient Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, OmniflowError>;
