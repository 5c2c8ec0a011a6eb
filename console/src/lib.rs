//! Wizard console - concrete collaborators for the connector wizard.
//!
//! # Architecture
//!
//! ```text
//!   stdin (JSON lines)
//!          ↓
//!     ConsoleCommand → WizardEvent
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       WizardService (connector-wizard)   │
//! └─────────────────────────────────────────┘
//!     ↓ resolve               ↓ create / update
//! FederatedRegistry       HttpConnectorApi
//!  (remote manifests)      (connector_mgmt API)
//! ```
//!
//! # Core Types
//!
//! - [`HttpConnectorApi`] - reqwest client for the connector-management API
//! - [`FederatedRegistry`] - configurators described by remote manifests
//! - [`Catalog`] - connector types and existing connectors from a JSON file
//! - [`ConsoleCommand`] - one line of console input

pub mod catalog;
pub mod federated;
pub mod http;
pub mod input;

pub use catalog::{load_catalog, Catalog};
pub use federated::{FederatedRegistry, Manifest, ManifestConfigurator};
pub use http::HttpConnectorApi;
pub use input::ConsoleCommand;
