//! Remote configurators.
//!
//! Connector types listed in the `[configurators]` config table get a custom
//! configurator described by a manifest fetched over HTTP:
//!
//! ```json
//! { "steps": ["Connection", "Topics"], "fields": { "Connection": ["url"] } }
//! ```
//!
//! Every other type resolves to the generic form.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use connector_wizard::config::{RemoteConfiguratorEntry, WizardConfig};
use connector_wizard::registry::{
    Configurator, ConfiguratorDescriptor, ConfiguratorProps, ConfiguratorRegistry,
};
use connector_wizard::ConnectorType;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Remote configurator manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub steps: Vec<String>,
    /// Step label -> field names shown on that step
    #[serde(default)]
    pub fields: HashMap<String, Vec<String>>,
}

/// Configurator rendering the fields a manifest assigns to each step.
pub struct ManifestConfigurator {
    name: String,
    manifest: Manifest,
}

impl ManifestConfigurator {
    pub fn new(name: impl Into<String>, manifest: Manifest) -> Self {
        Self {
            name: name.into(),
            manifest,
        }
    }

    fn step_fields(&self, step: usize) -> &[String] {
        self.manifest
            .steps
            .get(step)
            .and_then(|label| self.manifest.fields.get(label))
            .map(|f| f.as_slice())
            .unwrap_or(&[])
    }
}

impl Configurator for ManifestConfigurator {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &ConfiguratorProps<'_>) -> Value {
        let fields: Vec<Value> = self
            .step_fields(props.active_step)
            .iter()
            .map(|field| {
                json!({
                    "name": field,
                    "value": props.configuration.get(field).cloned().unwrap_or(Value::Null),
                })
            })
            .collect();

        json!({
            "kind": "manifest",
            "configurator": self.name,
            "connector_type": props.connector_type.id,
            "step": self.manifest.steps.get(props.active_step),
            "fields": fields,
            "duplicate_mode": props.duplicate_mode,
        })
    }
}

/// Registry backed by remote configurator manifests.
pub struct FederatedRegistry {
    entries: HashMap<String, RemoteConfiguratorEntry>,
    http_client: Client,
}

impl FederatedRegistry {
    pub fn new(config: &WizardConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("wizard-console/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            entries: config.configurators.clone(),
            http_client,
        })
    }

    fn entry_for(&self, connector_type: &ConnectorType) -> Option<(&str, &RemoteConfiguratorEntry)> {
        self.entries
            .get_key_value(&connector_type.id)
            .or_else(|| {
                let family = connector_type.family.as_ref()?;
                self.entries.get_key_value(family)
            })
            .map(|(key, entry)| (key.as_str(), entry))
    }

    async fn fetch_manifest(&self, url: &str) -> Result<Manifest> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch configurator manifest {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Configurator manifest {} returned {}", url, status));
        }

        response
            .json::<Manifest>()
            .await
            .with_context(|| format!("Failed to parse configurator manifest {}", url))
    }
}

#[async_trait]
impl ConfiguratorRegistry for FederatedRegistry {
    async fn resolve(&self, connector_type: &ConnectorType) -> Result<ConfiguratorDescriptor> {
        let Some((key, entry)) = self.entry_for(connector_type) else {
            debug!(connector_type = %connector_type.id, "No remote configurator, using generic form");
            return Ok(ConfiguratorDescriptor::generic());
        };

        let manifest = self.fetch_manifest(&entry.remote_entry).await?;
        let name = entry.name.clone().unwrap_or_else(|| key.to_string());
        info!(
            connector_type = %connector_type.id,
            configurator = %name,
            steps = manifest.steps.len(),
            "Remote configurator loaded"
        );

        let steps = manifest.steps.clone();
        let configurator = Arc::new(ManifestConfigurator::new(name, manifest));
        ConfiguratorDescriptor::custom(steps, configurator)
            .with_context(|| format!("Invalid configurator manifest {}", entry.remote_entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn config_with(key: &str, url: String) -> WizardConfig {
        let mut config = WizardConfig::default();
        config.configurators.insert(
            key.to_string(),
            RemoteConfiguratorEntry {
                remote_entry: url,
                name: None,
            },
        );
        config
    }

    #[tokio::test]
    async fn test_resolves_family_manifest() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/debezium/manifest.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "steps": ["Connection", "Tables"],
                    "fields": {"Connection": ["database.hostname", "database.port"]}
                }"#,
            )
            .create_async()
            .await;

        let config = config_with(
            "streaming-capture",
            format!("{}/debezium/manifest.json", server.url()),
        );
        let registry = FederatedRegistry::new(&config).unwrap();
        let connector_type = ConnectorType::new("debezium-postgres").with_family("streaming-capture");

        let descriptor = registry.resolve(&connector_type).await.unwrap();

        assert!(descriptor.is_custom());
        assert_eq!(
            descriptor.steps().unwrap(),
            &["Connection".to_string(), "Tables".to_string()]
        );
        let configurator = descriptor.configurator().unwrap();
        assert_eq!(configurator.name(), "streaming-capture");

        let mut values = serde_json::Map::new();
        values.insert("database.port".to_string(), json!(5432));
        let rendered = configurator.render(&ConfiguratorProps {
            active_step: 0,
            configuration: &values,
            connector_type: &connector_type,
            duplicate_mode: false,
        });
        assert_eq!(rendered["step"], "Connection");
        assert_eq!(rendered["fields"][1]["value"], 5432);
        assert_eq!(rendered["fields"][0]["value"], Value::Null);
    }

    #[tokio::test]
    async fn test_unlisted_type_is_generic() {
        let registry = FederatedRegistry::new(&WizardConfig::default()).unwrap();
        let descriptor = registry
            .resolve(&ConnectorType::new("http-sink"))
            .await
            .unwrap();
        assert!(!descriptor.is_custom());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.json")
            .with_status(404)
            .create_async()
            .await;

        let config = config_with("http-sink", format!("{}/missing.json", server.url()));
        let registry = FederatedRegistry::new(&config).unwrap();

        let err = registry
            .resolve(&ConnectorType::new("http-sink"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_manifest_without_steps_is_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty.json")
            .with_status(200)
            .with_body(r#"{"steps": []}"#)
            .create_async()
            .await;

        let config = config_with("http-sink", format!("{}/empty.json", server.url()));
        let registry = FederatedRegistry::new(&config).unwrap();

        let err = registry
            .resolve(&ConnectorType::new("http-sink"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid configurator manifest"));
    }
}
