//! Generic schema-driven form.
//!
//! Used for every connector type without a custom configurator. The form
//! reports edits through the same `change` event as a custom configurator.

use crate::connector::Configuration;
use crate::diff::is_empty_value;
use serde_json::{json, Value};

/// Renders and validates a configuration against a JSON schema.
pub trait SchemaForm: Send + Sync {
    fn render(&self, schema: &Value, configuration: &Configuration) -> Value;

    /// Validity reported alongside each `change` event.
    fn validate(&self, schema: &Value, configuration: &Configuration) -> bool;
}

/// Default form: echoes schema and values, validates `required` fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSchemaForm;

impl SchemaForm for JsonSchemaForm {
    fn render(&self, schema: &Value, configuration: &Configuration) -> Value {
        json!({
            "kind": "json-schema-form",
            "schema": schema,
            "configuration": configuration,
        })
    }

    fn validate(&self, schema: &Value, configuration: &Configuration) -> bool {
        missing_required(schema, configuration).is_empty()
    }
}

/// Names listed in the schema's top-level `required` array.
pub fn required_fields(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
        .unwrap_or_default()
}

/// Required fields that are absent or empty in `configuration`.
pub fn missing_required(schema: &Value, configuration: &Configuration) -> Vec<String> {
    required_fields(schema)
        .into_iter()
        .filter(|name| configuration.get(*name).map_or(true, is_empty_value))
        .map(|name| name.to_string())
        .collect()
}
