// Settings injection: environment variables exposed to templates

//! # Settings Provider
//!
//! Every run's context gets an `env` entry holding the variables returned by
//! the injected [`SettingsProvider`], so templates can reference
//! `{{env.API_KEY}}` without the engine reading process state directly.

use std::collections::HashMap;

/// Source of the environment variables injected under `env`
pub trait SettingsProvider: Send + Sync {
    fn env_vars(&self) -> HashMap<String, String>;
}

/// Exposes the host process environment
///
/// Pair with `dotenv` in the binary to pick up `.env` files.
#[derive(Debug, Default)]
pub struct ProcessEnvSettings;

impl SettingsProvider for ProcessEnvSettings {
    fn env_vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }
}

/// Fixed variable set, for tests and embedded hosts
#[derive(Debug, Default)]
pub struct InMemorySettings {
    vars: HashMap<String, String>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

impl SettingsProvider for InMemorySettings {
    fn env_vars(&self) -> HashMap<String, String> {
        self.vars.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_settings() {
        let mut settings = InMemorySettings::new();
        settings.set("API_KEY", "sk-1");
        assert_eq!(settings.env_vars()["API_KEY"], "sk-1");
    }

    #[test]
    fn test_process_env_settings_sees_process_vars() {
        std::env::set_var("OMNIFLOW_SETTINGS_TEST", "yes");
        assert_eq!(
            ProcessEnvSettings.env_vars()["OMNIFLOW_SETTINGS_TEST"],
            "yes"
        );
    }
}
