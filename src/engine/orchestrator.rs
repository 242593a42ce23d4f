// Pipeline orchestration: ordered stepping, retries, shared context

//! # Pipeline Orchestrator
//!
//! [`WorkflowEngine`] drives an app's components strictly in declared order.
//! Per step the state machine is `pending → running → (success | error)`:
//!
//! - `running` is emitted before the first attempt; streaming steps emit
//!   further `running` updates carrying the partial accumulated text
//! - the retry loop makes `retryCount + 1` attempts, sleeping `retryDelay`
//!   milliseconds before every attempt after the first
//! - on success, `<id>` (the step's data) and `<id>_response` (the full
//!   result envelope) are recorded in the shared context
//! - on exhausted failure, `<id>_error` is recorded and the run halts unless
//!   the step's flow control sets `continueOnError`
//!
//! Step transitions are delivered over an unbounded channel; a host that has
//! dropped its receiver cannot fail the run (send errors are ignored).
//! Cancellation is not modeled: dropping the `execute_app` future aborts the
//! in-flight HTTP call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use super::executor::execute_component;
use super::storage::AppRepository;
use super::template::interpolate_string;
use super::Context;
use crate::http::HttpClient;
use crate::settings::SettingsProvider;
use crate::{OmniflowError, Result};

/// Lifecycle state of one pipeline step as reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Error,
}

/// One step transition event
///
/// For `running`, `result` may carry partial streamed text; for `success`
/// it carries the step's output data.
#[derive(Debug, Clone, Serialize)]
pub struct StepUpdate {
    pub component_id: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepUpdate {
    fn running(component_id: &str, partial: Option<Value>) -> Self {
        Self {
            component_id: component_id.to_string(),
            status: StepStatus::Running,
            result: partial,
            error: None,
        }
    }

    fn success(component_id: &str, data: Value) -> Self {
        Self {
            component_id: component_id.to_string(),
            status: StepStatus::Success,
            result: Some(data),
            error: None,
        }
    }

    fn error(component_id: &str, message: String) -> Self {
        Self {
            component_id: component_id.to_string(),
            status: StepStatus::Error,
            result: None,
            error: Some(message),
        }
    }
}

/// Pipeline orchestrator over injected collaborators
///
/// Holds no per-run state of its own; each [`execute_app`] call owns its
/// context exclusively, so independent runs may execute concurrently.
///
/// [`execute_app`]: WorkflowEngine::execute_app
pub struct WorkflowEngine {
    apps: Arc<dyn AppRepository>,
    client: Arc<dyn HttpClient>,
    settings: Arc<dyn SettingsProvider>,
}

impl WorkflowEngine {
    pub fn new(
        apps: Arc<dyn AppRepository>,
        client: Arc<dyn HttpClient>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            apps,
            client,
            settings,
        }
    }

    /// Run one app to completion or halt
    ///
    /// `inputs` maps component id to that step's caller-supplied parameter
    /// values. `initial_context` entries overlay the system entries
    /// (`$session_id`, `$timestamp`, `env`), so chat hosts can inject
    /// `$messages`/`$history` or pin their own session id.
    ///
    /// Returns `Err` only when the app definition cannot be loaded; every
    /// step failure is reported as an `error` update instead.
    pub async fn execute_app(
        &self,
        app_id: &str,
        inputs: &HashMap<String, Context>,
        updates: &UnboundedSender<StepUpdate>,
        initial_context: Context,
    ) -> Result<()> {
        let app = self
            .apps
            .get_app(app_id)
            .await?
            .ok_or_else(|| OmniflowError::AppNotFound {
                id: app_id.to_string(),
            })?;

        let mut context = Context::new();
        context.insert(
            "$session_id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        context.insert(
            "$timestamp".to_string(),
            Value::String(chrono::Utc::now().timestamp_millis().to_string()),
        );
        context.insert(
            "env".to_string(),
            Value::Object(
                self.settings
                    .env_vars()
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        );
        context.extend(initial_context);

        info!(app = %app.id, components = app.components.len(), "starting pipeline run");

        for component in &app.components {
            emit(updates, StepUpdate::running(&component.id, None));

            // A user-entered input may itself reference env.* or a prior
            // step; resolve those before merging.
            let mut step_inputs = inputs.get(&component.id).cloned().unwrap_or_default();
            for value in step_inputs.values_mut() {
                if let Value::String(s) = value {
                    if s.contains("{{") {
                        *value = Value::String(interpolate_string(s, &context));
                    }
                }
            }

            let flow = component.effective_flow_control();
            let mut attempts = 0u32;
            let mut success = false;
            let mut last_error = String::new();

            while attempts <= flow.retry_count && !success {
                if attempts > 0 {
                    info!(component = %component.id, attempt = attempts, "retrying step");
                    tokio::time::sleep(Duration::from_millis(flow.retry_delay)).await;
                }

                let mut on_partial = |partial: &str| {
                    emit(
                        updates,
                        StepUpdate::running(
                            &component.id,
                            Some(Value::String(partial.to_string())),
                        ),
                    );
                };

                let result = execute_component(
                    self.client.as_ref(),
                    component,
                    &step_inputs,
                    &context,
                    Some(&mut on_partial),
                )
                .await;

                if result.success {
                    success = true;
                    let data = result.data.clone().unwrap_or(Value::Null);
                    context.insert(component.id.clone(), data.clone());
                    context.insert(
                        format!("{}_response", component.id),
                        serde_json::to_value(&result).unwrap_or(Value::Null),
                    );
                    emit(updates, StepUpdate::success(&component.id, data));
                } else {
                    last_error = result
                        .error
                        .unwrap_or_else(|| "Unknown error".to_string());
                }
                attempts += 1;
            }

            if !success {
                emit(updates, StepUpdate::error(&component.id, last_error.clone()));
                context.insert(
                    format!("{}_error", component.id),
                    Value::String(last_error),
                );
                if !flow.continue_on_error {
                    // Halt the pipeline; remaining components stay pending
                    break;
                }
                warn!(component = %component.id, "step failed, continueOnError is set");
            }
        }

        Ok(())
    }
}

fn emit(updates: &UnboundedSender<StepUpdate>, update: StepUpdate) {
    // A closed receiver must not fail the run
    let _ = updates.send(update);
}
