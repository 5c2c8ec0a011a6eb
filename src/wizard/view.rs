use super::machine::{WizardMachine, WizardStage};
use crate::connector::{Configuration, ConnectorType};
use crate::form::SchemaForm;
use crate::loader::LoaderId;
use crate::registry::{Configurator, ConfiguratorProps};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Which configuration UI the wizard shows.
#[derive(Clone)]
pub enum ConfiguratorView {
    /// Configurator is being resolved
    Loading,
    /// Resolution failed
    Failed { description: String },
    /// Custom multi-step configurator
    Custom {
        configurator: Arc<dyn Configurator>,
        steps: Vec<String>,
        /// Loader to tag change events with
        origin: LoaderId,
    },
    /// Generic schema-driven form
    GenericForm { schema: Value, origin: LoaderId },
}

impl ConfiguratorView {
    /// Loader whose UI is on screen; edits must carry this id.
    pub fn origin(&self) -> Option<LoaderId> {
        match self {
            ConfiguratorView::Custom { origin, .. } | ConfiguratorView::GenericForm { origin, .. } => {
                Some(*origin)
            }
            ConfiguratorView::Loading | ConfiguratorView::Failed { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ConfiguratorView::Loading => "loading",
            ConfiguratorView::Failed { .. } => "failed",
            ConfiguratorView::Custom { .. } => "custom",
            ConfiguratorView::GenericForm { .. } => "generic_form",
        }
    }
}

impl fmt::Debug for ConfiguratorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfiguratorView::Loading => f.write_str("Loading"),
            ConfiguratorView::Failed { description } => f
                .debug_struct("Failed")
                .field("description", description)
                .finish(),
            ConfiguratorView::Custom {
                configurator,
                steps,
                origin,
            } => f
                .debug_struct("Custom")
                .field("configurator", &configurator.name())
                .field("steps", steps)
                .field("origin", origin)
                .finish(),
            ConfiguratorView::GenericForm { schema, origin } => f
                .debug_struct("GenericForm")
                .field("schema", schema)
                .field("origin", origin)
                .finish(),
        }
    }
}

/// Read-only snapshot of a wizard run.
#[derive(Clone, Debug, Serialize)]
pub struct WizardView {
    pub run_id: Uuid,
    pub stage: WizardStage,
    pub connector_type: Option<ConnectorType>,
    pub active_step: usize,
    /// Step labels of a custom configurator
    pub steps: Option<Vec<String>>,
    /// Configuration shown to the user; merged with the source in duplicate mode
    pub configuration: Configuration,
    pub can_advance: bool,
    pub can_submit: bool,
    pub edit_mode: bool,
    pub duplicate_mode: bool,
    pub name: Option<String>,
    pub failure: Option<String>,
    #[serde(skip)]
    pub configurator: Option<ConfiguratorView>,
}

/// Projects the machine state into a view.
pub fn project(machine: &WizardMachine) -> WizardView {
    let stage = machine.stage();
    let ctx = machine.context();
    let store = ctx.store();
    let duplicate_mode = ctx.mode().is_duplicate();

    let configuration = if duplicate_mode {
        ctx.merged_configuration()
    } else {
        store.configuration().clone()
    };

    let configurator = match (stage, machine.current_loader()) {
        (WizardStage::LoadingConfigurator, _) => Some(ConfiguratorView::Loading),
        (WizardStage::Configuring, Some(origin)) => Some(match ctx.descriptor() {
            Some(descriptor) => match (descriptor.configurator(), descriptor.steps()) {
                (Some(configurator), Some(steps)) => ConfiguratorView::Custom {
                    configurator: Arc::clone(configurator),
                    steps: steps.to_vec(),
                    origin,
                },
                _ => ConfiguratorView::GenericForm {
                    schema: ctx
                        .connector_type()
                        .and_then(|t| t.schema.clone())
                        .unwrap_or_else(|| json!({})),
                    origin,
                },
            },
            None => ConfiguratorView::Loading,
        }),
        (WizardStage::Failure, _) => ctx.failure().map(|failure| ConfiguratorView::Failed {
            description: failure.description.clone(),
        }),
        _ => None,
    };

    let can_advance =
        stage == WizardStage::Configuring && store.is_step_valid(ctx.active_step());
    let can_submit = matches!(stage, WizardStage::Configuring | WizardStage::Reviewing)
        && ctx.all_steps_valid();

    WizardView {
        run_id: machine.run_id(),
        stage,
        connector_type: ctx.connector_type().cloned(),
        active_step: ctx.active_step(),
        steps: ctx.descriptor().and_then(|d| d.steps()).map(|s| s.to_vec()),
        configuration,
        can_advance,
        can_submit,
        edit_mode: ctx.mode().is_edit(),
        duplicate_mode,
        name: ctx.name().map(str::to_string),
        failure: ctx.failure().map(|f| f.to_string()),
        configurator,
    }
}

impl WizardView {
    /// Renders the configuration UI for the active step.
    ///
    /// Returns `None` when no configurator is on screen.
    pub fn render(&self, form: &dyn SchemaForm) -> Option<Value> {
        let connector_type = self.connector_type.as_ref()?;
        match self.configurator.as_ref()? {
            ConfiguratorView::Custom { configurator, .. } => {
                Some(configurator.render(&ConfiguratorProps {
                    active_step: self.active_step,
                    configuration: &self.configuration,
                    connector_type,
                    duplicate_mode: self.duplicate_mode,
                }))
            }
            ConfiguratorView::GenericForm { schema, .. } => {
                Some(form.render(schema, &self.configuration))
            }
            ConfiguratorView::Loading => Some(json!({ "kind": "loading" })),
            ConfiguratorView::Failed { description } => Some(json!({
                "kind": "failed",
                "description": description,
            })),
        }
    }

    /// Kind of configurator on screen, for logs and the console.
    pub fn configurator_kind(&self) -> Option<&'static str> {
        self.configurator.as_ref().map(ConfiguratorView::kind)
    }
}
