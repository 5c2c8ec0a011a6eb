// Connector types and existing connector instances
pub mod connector;

// Configurator descriptors and registries
pub mod registry;

// Edit-mode patch payloads and duplicate-mode merge
pub mod diff;

// Working configuration, baseline and step validity
pub mod state;

// Asynchronous configurator resolution
pub mod loader;

// Wizard state machine, event loop and read model
pub mod wizard;

// Generic schema-driven form contract
pub mod form;

// External collaborators: credentials and the connector API
pub mod auth;
pub mod submit;

pub mod config;

pub use connector::{Configuration, ConnectorInstance, ConnectorType};
pub use registry::{Configurator, ConfiguratorDescriptor, ConfiguratorProps, ConfiguratorRegistry};
pub use wizard::{
    project, WizardEvent, WizardHandle, WizardMachine, WizardMode, WizardService, WizardStage,
    WizardView,
};
