// App and session domain models

//! # App Models
//!
//! An [`App`] is an ordered pipeline of components together with the
//! presentation metadata the host uses to render it. A [`Session`] is one
//! saved run surface for an app (a chat transcript or a panel's input
//! values); the engine itself never writes sessions, hosts do.

use serde::{Deserialize, Serialize};

use super::Component;
use crate::Result;

/// How the host presents a run of this app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppRunMode {
    #[default]
    Chat,
    Panel,
}

/// Layout direction for panel rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDirection {
    Vertical,
    Horizontal,
}

/// Optional layout hints for panel apps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub direction: LayoutDirection,
    pub gap: u32,
}

/// An assembled pipeline of components
///
/// The engine treats the definition as immutable for the duration of a run:
/// it is loaded from the repository at run start and later edits are not
/// observed mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Icon name used by the host UI
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub run_mode: AppRunMode,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_config: Option<LayoutConfig>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

impl App {
    /// Validate every component definition in pipeline order
    pub fn validate(&self) -> Result<()> {
        for component in &self.components {
            component.validate()?;
        }
        Ok(())
    }
}

/// A saved run surface for an app
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub app_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AppRunMode,
    /// Host-defined payload: chat messages for chat sessions, input values
    /// for panel sessions
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}
