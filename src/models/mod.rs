// Domain models for Omniflow
// Pure data definitions, no execution logic

//! # Domain Models
//!
//! The data model mirrors the JSON documents the engine consumes: an
//! [`App`] is an ordered list of [`Component`]s, each wrapping one HTTP
//! call ([`ApiConfig`]) plus its parameter definitions and optional flow
//! control policy. The order of `App::components` is the pipeline's only
//! control-flow primitive.
//!
//! All wire names are camelCase to stay compatible with stored definitions.

pub mod app;
pub mod component;

pub use app::{App, AppRunMode, LayoutConfig, LayoutDirection, Session};
pub use component::{
    ApiConfig, ApiHeader, BodyType, Component, FlowControl, HttpMethod, ParamDefinition,
    ParamUiType, SelectOption,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of one component execution attempt
///
/// Produced once per attempt by the executor; the orchestrator stores the
/// envelope of the successful attempt in the run context under
/// `<componentId>_response`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration of the attempt in milliseconds
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl ExecutionResult {
    pub fn failure(error: impl Into<String>, duration: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            duration,
            headers: None,
        }
    }
}
