//! Connector catalog types.
//!
//! A [`ConnectorType`] describes one integration kind (its configuration
//! schema and family). A [`ConnectorInstance`] is an existing connector, used
//! as the baseline when editing or duplicating.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name → field value mapping edited by a configurator.
pub type Configuration = Map<String, Value>;

/// Catalog entry for one connector kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorType {
    /// Unique type identifier (e.g. "aws-sqs-source-v1alpha1")
    pub id: String,

    /// Human-readable label
    #[serde(default)]
    pub name: String,

    /// JSON schema describing the configuration shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,

    /// Family requiring a dedicated configurator (e.g. "streaming-capture")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

impl ConnectorType {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            schema: None,
            family: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Top-level property names declared by the schema.
    ///
    /// Returns `None` when there is no schema or it declares no `properties`
    /// object, meaning every key is accepted.
    pub fn schema_keys(&self) -> Option<Vec<&str>> {
        let properties = self.schema.as_ref()?.get("properties")?.as_object()?;
        Some(properties.keys().map(|k| k.as_str()).collect())
    }

    /// Drops keys the schema does not declare.
    pub fn retain_schema_keys(&self, configuration: &mut Configuration) {
        if let Some(keys) = self.schema_keys() {
            configuration.retain(|k, _| keys.contains(&k.as_str()));
        }
    }
}

/// An existing connector as returned by the connector-management API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorInstance {
    pub id: String,
    pub name: String,
    pub connector_type_id: String,

    /// Persisted configuration
    #[serde(default)]
    pub connector: Configuration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sqs_type() -> ConnectorType {
        ConnectorType::new("aws-sqs-source").with_schema(json!({
            "type": "object",
            "properties": {
                "queue": {"type": "string"},
                "region": {"type": "string"}
            },
            "required": ["queue"]
        }))
    }

    #[test]
    fn test_schema_keys() {
        let connector_type = sqs_type();
        let mut keys = connector_type.schema_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["queue", "region"]);
    }

    #[test]
    fn test_schema_keys_without_schema() {
        assert!(ConnectorType::new("plain").schema_keys().is_none());
    }

    #[test]
    fn test_retain_schema_keys() {
        let mut config = json!({"queue": "q1", "topic": "stale"})
            .as_object()
            .cloned()
            .unwrap();
        sqs_type().retain_schema_keys(&mut config);
        assert_eq!(Value::Object(config), json!({"queue": "q1"}));
    }

    #[test]
    fn test_retain_without_schema_keeps_everything() {
        let mut config = json!({"anything": 1}).as_object().cloned().unwrap();
        ConnectorType::new("plain").retain_schema_keys(&mut config);
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_deserialize_catalog_entry() {
        let json = r#"{
            "id": "debezium-postgres",
            "name": "Debezium PostgreSQL",
            "family": "streaming-capture"
        }"#;
        let ct: ConnectorType = serde_json::from_str(json).unwrap();
        assert_eq!(ct.id, "debezium-postgres");
        assert_eq!(ct.family.as_deref(), Some("streaming-capture"));
        assert!(ct.schema.is_none());
    }
}
