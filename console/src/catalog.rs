use anyhow::{anyhow, Context, Result};
use connector_wizard::{ConnectorInstance, ConnectorType, WizardMode};
use serde::Deserialize;

/// Connector types offered by the console plus existing connectors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub connector_types: Vec<ConnectorType>,
    /// Existing connectors that can be edited or duplicated
    #[serde(default)]
    pub connectors: Vec<ConnectorInstance>,
}

impl Catalog {
    pub fn connector_type(&self, id: &str) -> Option<&ConnectorType> {
        self.connector_types.iter().find(|t| t.id == id)
    }

    pub fn connector(&self, id: &str) -> Option<&ConnectorInstance> {
        self.connectors.iter().find(|c| c.id == id)
    }

    /// Parses `create`, `edit:<connector-id>` or `duplicate:<connector-id>`.
    pub fn mode(&self, input: &str) -> Result<WizardMode> {
        let (kind, id) = match input.split_once(':') {
            Some((kind, id)) => (kind, Some(id)),
            None => (input, None),
        };

        let instance = |id: Option<&str>| -> Result<ConnectorInstance> {
            let id = id.ok_or_else(|| anyhow!("Mode '{}' needs a connector id", kind))?;
            self.connector(id)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown connector '{}'", id))
        };

        match kind {
            "create" => Ok(WizardMode::Create),
            "edit" => Ok(WizardMode::Edit(instance(id)?)),
            "duplicate" => Ok(WizardMode::Duplicate(instance(id)?)),
            other => Err(anyhow!("Unknown wizard mode '{}'", other)),
        }
    }
}

/// Load the catalog from a JSON file
pub fn load_catalog(path: &str) -> Result<Catalog> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path))?;
    let catalog: Catalog = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse catalog file {}", path))?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "connector_types": [
            {"id": "http-sink", "name": "HTTP sink", "schema": {"properties": {"url": {}}}},
            {"id": "debezium-postgres", "family": "streaming-capture"}
        ],
        "connectors": [
            {"id": "conn-1", "name": "orders", "connector_type_id": "http-sink",
             "connector": {"url": "https://example.com"}}
        ]
    }"#;

    #[test]
    fn test_load_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", CATALOG).unwrap();

        let catalog = load_catalog(file.path().to_str().unwrap()).unwrap();

        assert_eq!(catalog.connector_types.len(), 2);
        let debezium = catalog.connector_type("debezium-postgres").unwrap();
        assert_eq!(debezium.family.as_deref(), Some("streaming-capture"));
        assert_eq!(debezium.name, "");
        assert_eq!(catalog.connector("conn-1").unwrap().name, "orders");
    }

    #[test]
    fn test_mode_parsing() {
        let catalog: Catalog = serde_json::from_str(CATALOG).unwrap();

        assert_eq!(catalog.mode("create").unwrap(), WizardMode::Create);
        assert!(catalog.mode("edit:conn-1").unwrap().is_edit());
        assert!(catalog.mode("duplicate:conn-1").unwrap().is_duplicate());
        assert!(catalog.mode("edit").is_err());
        assert!(catalog.mode("edit:missing").is_err());
        assert!(catalog.mode("delete:conn-1").is_err());
    }

    #[test]
    fn test_missing_catalog_file() {
        let err = load_catalog("/nonexistent/catalog.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read catalog file"));
    }
}
