use crate::catalog::Catalog;
use anyhow::{anyhow, Result};
use connector_wizard::form::SchemaForm;
use connector_wizard::wizard::{ConfigChange, ConfiguratorView};
use connector_wizard::{Configuration, WizardEvent, WizardView};
use serde::Deserialize;

/// One line of console input.
///
/// ```json
/// {"action": "select", "connector_type": "http-sink"}
/// {"action": "change", "configuration": {"url": "https://example.com"}}
/// {"action": "next"}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConsoleCommand {
    Select {
        connector_type: String,
    },
    Change {
        configuration: Configuration,
        /// Required for custom configurators; computed for the generic form
        #[serde(default)]
        valid: Option<bool>,
    },
    Next,
    Previous,
    GoTo {
        step: usize,
    },
    Name {
        name: String,
    },
    Submit,
    Retry,
    Cancel,
}

impl ConsoleCommand {
    /// Translates the command against the current view.
    pub fn into_event(
        self,
        view: &WizardView,
        catalog: &Catalog,
        form: &dyn SchemaForm,
    ) -> Result<WizardEvent> {
        let event = match self {
            ConsoleCommand::Select { connector_type } => {
                let connector_type = catalog
                    .connector_type(&connector_type)
                    .cloned()
                    .ok_or_else(|| anyhow!("Unknown connector type '{}'", connector_type))?;
                WizardEvent::SelectType(connector_type)
            }
            ConsoleCommand::Change {
                configuration,
                valid,
            } => {
                let on_screen = view
                    .configurator
                    .as_ref()
                    .ok_or_else(|| anyhow!("No configurator on screen"))?;
                let origin = on_screen
                    .origin()
                    .ok_or_else(|| anyhow!("Configurator is not ready"))?;
                let is_valid = match (valid, on_screen) {
                    (Some(valid), _) => valid,
                    (None, ConfiguratorView::GenericForm { schema, .. }) => {
                        form.validate(schema, &configuration)
                    }
                    (None, _) => {
                        return Err(anyhow!("Custom configurator changes must set 'valid'"))
                    }
                };
                WizardEvent::Change(ConfigChange {
                    origin,
                    configuration,
                    is_valid,
                })
            }
            ConsoleCommand::Next => WizardEvent::Next,
            ConsoleCommand::Previous => WizardEvent::Previous,
            ConsoleCommand::GoTo { step } => WizardEvent::GoTo(step),
            ConsoleCommand::Name { name } => WizardEvent::SetName(name),
            ConsoleCommand::Submit => WizardEvent::Submit,
            ConsoleCommand::Retry => WizardEvent::Retry,
            ConsoleCommand::Cancel => WizardEvent::Cancel,
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector_wizard::auth::StaticTokenProvider;
    use connector_wizard::form::JsonSchemaForm;
    use connector_wizard::registry::ConfiguratorDescriptor;
    use connector_wizard::wizard::{WizardMode, WizardParams};
    use connector_wizard::{project, ConnectorType, WizardMachine};
    use serde_json::json;
    use std::sync::Arc;

    fn catalog() -> Catalog {
        Catalog {
            connector_types: vec![ConnectorType::new("http-sink").with_schema(json!({
                "properties": {"url": {"type": "string"}},
                "required": ["url"]
            }))],
            connectors: Vec::new(),
        }
    }

    fn configuring_machine() -> WizardMachine {
        let mut machine = WizardMachine::new(WizardParams {
            auth_token: Arc::new(StaticTokenProvider::new("t")),
            base_path: "http://localhost:8000".to_string(),
            mode: WizardMode::Create,
        });
        let connector_type = catalog().connector_types[0].clone();
        machine.send(WizardEvent::SelectType(connector_type));
        let loader = machine.current_loader().unwrap();
        machine.send(WizardEvent::ConfiguratorReady {
            loader,
            descriptor: ConfiguratorDescriptor::generic(),
        });
        machine
    }

    #[test]
    fn test_parse_commands() {
        let select: ConsoleCommand =
            serde_json::from_str(r#"{"action": "select", "connector_type": "http-sink"}"#).unwrap();
        assert_eq!(
            select,
            ConsoleCommand::Select {
                connector_type: "http-sink".to_string()
            }
        );

        let go_to: ConsoleCommand = serde_json::from_str(r#"{"action": "go_to", "step": 2}"#).unwrap();
        assert_eq!(go_to, ConsoleCommand::GoTo { step: 2 });

        assert!(serde_json::from_str::<ConsoleCommand>(r#"{"action": "delete"}"#).is_err());
    }

    #[test]
    fn test_select_unknown_type() {
        let view = project(&configuring_machine());
        let command = ConsoleCommand::Select {
            connector_type: "nope".to_string(),
        };
        assert!(command.into_event(&view, &catalog(), &JsonSchemaForm).is_err());
    }

    #[test]
    fn test_generic_change_is_validated() {
        let machine = configuring_machine();
        let view = project(&machine);

        let command = ConsoleCommand::Change {
            configuration: Configuration::new(),
            valid: None,
        };
        match command.into_event(&view, &catalog(), &JsonSchemaForm).unwrap() {
            WizardEvent::Change(change) => {
                assert!(!change.is_valid);
                assert_eq!(Some(change.origin), machine.current_loader());
            }
            other => panic!("expected change, got {:?}", other),
        }
    }

    #[test]
    fn test_change_without_configurator() {
        let machine = WizardMachine::new(WizardParams {
            auth_token: Arc::new(StaticTokenProvider::new("t")),
            base_path: String::new(),
            mode: WizardMode::Create,
        });
        let command = ConsoleCommand::Change {
            configuration: Configuration::new(),
            valid: Some(true),
        };
        assert!(command
            .into_event(&project(&machine), &catalog(), &JsonSchemaForm)
            .is_err());
    }
}
