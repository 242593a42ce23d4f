// Component domain models: one configured HTTP call plus its parameters

//! # Component Models
//!
//! A [`Component`] encapsulates one HTTP call ([`ApiConfig`]) together with
//! the parameter definitions that feed its templates and an optional
//! [`FlowControl`] policy. Parameter keys become template variable names, so
//! the `$` prefix and `.` separator are reserved and rejected by
//! [`Component::validate`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{OmniflowError, Result};

/// HTTP methods supported by component configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the request body template is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BodyType {
    /// `bodyTemplate` is a JSON document run through structured interpolation
    Json,
    /// `bodyTemplate` is a JSON array of `{key,value}` form entries
    FormData,
    /// No body is sent
    #[default]
    None,
}

/// One header row in a component configuration
///
/// Keys are not required to be unique; when the final header map is built,
/// later duplicates overwrite earlier ones. Rows with an empty key are
/// skipped.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiHeader {
    #[serde(default)]
    pub id: String,
    pub key: String,
    pub value: String,
}

/// The HTTP call a component makes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<ApiHeader>,
    #[serde(default)]
    pub body_type: BodyType,
    /// Template string with `{{variable}}` placeholders: a JSON document for
    /// `json`, a JSON-encoded entry array for `form-data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
    /// Enable streaming response handling (SSE or raw chunks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::GET,
            headers: Vec::new(),
            body_type: BodyType::None,
            body_template: None,
            stream: None,
        }
    }
}

/// Widget hint for user-facing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamUiType {
    #[default]
    Input,
    Textarea,
    Select,
    Password,
    File,
    Number,
    Date,
    Boolean,
    Radio,
    Email,
}

/// Option entry for `select` and `radio` parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// One declared parameter of a component
///
/// The `key` is the template variable name visible to `{{key}}` references
/// in the component's own URL, headers and body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDefinition {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub label: String,
    /// Default value when the caller supplies none; fixed value for hidden
    /// parameters
    #[serde(default)]
    pub value: String,
    /// `true` = user-supplied, `false` = hidden/fixed system parameter
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub ui_type: ParamUiType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

fn default_true() -> bool {
    true
}

impl ParamDefinition {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            key: key.into(),
            label: String::new(),
            value: value.into(),
            is_visible: true,
            ui_type: ParamUiType::Input,
            options: None,
            description: None,
            required: None,
        }
    }
}

/// Retry and failure policy for one pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowControl {
    /// If true, the pipeline continues past this step even when all
    /// attempts fail
    #[serde(default)]
    pub continue_on_error: bool,
    /// Additional attempts after the first failure
    #[serde(default)]
    pub retry_count: u32,
    /// Sleep between attempts, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    /// Optional per-step timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_retry_delay() -> u64 {
    1000
}

impl Default for FlowControl {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            retry_count: 0,
            retry_delay: default_retry_delay(),
            timeout: None,
        }
    }
}

/// One pipeline step: an HTTP call plus its parameter definitions
///
/// Identity is by `id`; position within `App::components` defines execution
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub api_config: ApiConfig,
    #[serde(default)]
    pub parameters: Vec<ParamDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_control: Option<FlowControl>,
}

impl Component {
    /// Flow control for this step, falling back to the defaults
    /// (`continueOnError: false`, `retryCount: 0`, `retryDelay: 1000`)
    pub fn effective_flow_control(&self) -> FlowControl {
        self.flow_control.clone().unwrap_or_default()
    }

    /// Check the parameter-key invariants
    ///
    /// Keys must be non-empty, unique within the component, must not start
    /// with `$` (reserved for system variables) and must not contain `.`
    /// (the path separator of the template language).
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for param in &self.parameters {
            if param.key.is_empty() {
                return Err(OmniflowError::InvalidComponent(format!(
                    "component '{}' has a parameter with an empty key",
                    self.id
                )));
            }
            if param.key.starts_with('$') {
                return Err(OmniflowError::InvalidComponent(format!(
                    "parameter key '{}' must not start with '$'",
                    param.key
                )));
            }
            if param.key.contains('.') {
                return Err(OmniflowError::InvalidComponent(format!(
                    "parameter key '{}' must not contain '.'",
                    param.key
                )));
            }
            if !seen.insert(param.key.as_str()) {
                return Err(OmniflowError::InvalidComponent(format!(
                    "duplicate parameter key '{}' in component '{}'",
                    param.key, self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component_with_keys(keys: &[&str]) -> Component {
        Component {
            id: "comp1".to_string(),
            name: "Test".to_string(),
            description: None,
            api_config: ApiConfig::default(),
            parameters: keys
                .iter()
                .map(|k| ParamDefinition::new(*k, ""))
                .collect(),
            flow_control: None,
        }
    }

    #[test]
    fn test_validate_accepts_plain_keys() {
        assert!(component_with_keys(&["prompt", "api_key", "model-name"])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_dollar_prefix() {
        assert!(component_with_keys(&["$messages"]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_key() {
        assert!(component_with_keys(&["user.name"]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        assert!(component_with_keys(&["prompt", "prompt"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_flow_control_defaults() {
        let fc = component_with_keys(&[]).effective_flow_control();
        assert!(!fc.continue_on_error);
        assert_eq!(fc.retry_count, 0);
        assert_eq!(fc.retry_delay, 1000);
    }

    #[test]
    fn test_component_deserializes_camel_case() {
        let json = r#"{
            "id": "c1",
            "name": "Chat",
            "apiConfig": {
                "url": "https://api.example.com/v1/chat",
                "method": "POST",
                "headers": [{"id": "h1", "key": "Authorization", "value": "Bearer {{env.API_KEY}}"}],
                "bodyType": "json",
                "bodyTemplate": "{\"model\": \"{{model}}\"}",
                "stream": true
            },
            "parameters": [
                {"id": "p1", "key": "model", "label": "Model", "value": "gpt-4o", "isVisible": false, "uiType": "input"}
            ],
            "flowControl": {"continueOnError": true, "retryCount": 2, "retryDelay": 500}
        }"#;

        let component: Component = serde_json::from_str(json).unwrap();
        assert_eq!(component.api_config.method, HttpMethod::POST);
        assert_eq!(component.api_config.body_type, BodyType::Json);
        assert_eq!(component.api_config.stream, Some(true));
        assert!(!component.parameters[0].is_visible);
        let fc = component.effective_flow_control();
        assert!(fc.continue_on_error);
        assert_eq!(fc.retry_count, 2);
        assert_eq!(fc.retry_delay, 500);
    }
}
