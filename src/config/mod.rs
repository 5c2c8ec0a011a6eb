use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Complete wizard configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WizardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Remote configurators keyed by connector type id or family
    #[serde(default)]
    pub configurators: HashMap<String, RemoteConfiguratorEntry>,
}

/// Connector-management API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

fn default_base_path() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
        }
    }
}

/// Configurator loader configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Resolution timeout in seconds (0 disables the timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LoaderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Where to fetch a remote configurator manifest from
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteConfiguratorEntry {
    pub remote_entry: String,
    /// Name used in logs; defaults to the table key
    #[serde(default)]
    pub name: Option<String>,
}

impl WizardConfig {
    /// Overrides values from environment variables.
    ///
    /// - `COS_API_BASE_PATH`
    /// - `COS_LOADER_TIMEOUT_SECS`
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("COS_API_BASE_PATH") {
            if !v.is_empty() {
                self.api.base_path = v;
            }
        }
        if let Ok(v) = std::env::var("COS_LOADER_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                self.loader.timeout_secs = n;
            }
        }
    }

    /// Remote entry for a connector type: by id, then by family.
    pub fn configurator_for(
        &self,
        type_id: &str,
        family: Option<&str>,
    ) -> Option<&RemoteConfiguratorEntry> {
        self.configurators
            .get(type_id)
            .or_else(|| family.and_then(|f| self.configurators.get(f)))
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<WizardConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: WizardConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}
