//! Configurator registry - Maps connector types to configuration UIs.
//!
//! Every connector type resolves to a [`ConfiguratorDescriptor`]: either a
//! custom multi-step [`Configurator`] with its ordered step labels, or the
//! generic schema-driven form. Unknown types always resolve to the generic
//! form; only I/O performed by a registry implementation can fail.
//!
//! # Implementations
//!
//! - [`StaticRegistry`] - in-process registrations keyed by type id or family
//! - [`CachingRegistry`] - memoizes successful resolutions of another registry

use crate::connector::{Configuration, ConnectorType};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

mod cache;
mod static_registry;
#[cfg(test)]
mod tests;

pub use cache::CachingRegistry;
pub use static_registry::StaticRegistry;

/// Inputs handed to a configurator when it renders a step.
#[derive(Clone, Copy, Debug)]
pub struct ConfiguratorProps<'a> {
    pub active_step: usize,
    pub configuration: &'a Configuration,
    pub connector_type: &'a ConnectorType,
    pub duplicate_mode: bool,
}

/// A custom configuration UI for one or more connector types.
///
/// Rendering produces an opaque UI document interpreted by the host. Edits
/// flow back to the wizard as `change` events, never through the
/// configurator itself.
pub trait Configurator: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Renders the active step.
    fn render(&self, props: &ConfiguratorProps<'_>) -> Value;
}

/// Errors building a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorError {
    /// A custom configurator was registered without step labels.
    NoSteps(String),
    /// A step label was blank.
    BlankStep { configurator: String, index: usize },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::NoSteps(name) => {
                write!(f, "configurator '{}' declares no steps", name)
            }
            DescriptorError::BlankStep {
                configurator,
                index,
            } => write!(
                f,
                "configurator '{}' has a blank label for step {}",
                configurator, index
            ),
        }
    }
}

impl std::error::Error for DescriptorError {}

#[derive(Clone)]
struct CustomUi {
    steps: Vec<String>,
    configurator: Arc<dyn Configurator>,
}

/// Resolved `{steps, Configurator}` pair for a connector type.
///
/// Either both are present (custom UI with at least one step) or both are
/// absent (generic form). The fields are private so the pairing cannot be
/// broken.
#[derive(Clone)]
pub struct ConfiguratorDescriptor {
    custom: Option<CustomUi>,
}

impl ConfiguratorDescriptor {
    /// Descriptor for the generic schema-driven form.
    pub fn generic() -> Self {
        Self { custom: None }
    }

    /// Descriptor for a custom configurator.
    pub fn custom(
        steps: Vec<String>,
        configurator: Arc<dyn Configurator>,
    ) -> Result<Self, DescriptorError> {
        if steps.is_empty() {
            return Err(DescriptorError::NoSteps(configurator.name().to_string()));
        }
        if let Some(index) = steps.iter().position(|s| s.trim().is_empty()) {
            return Err(DescriptorError::BlankStep {
                configurator: configurator.name().to_string(),
                index,
            });
        }
        Ok(Self {
            custom: Some(CustomUi {
                steps,
                configurator,
            }),
        })
    }

    /// Ordered step labels, or `None` for the generic form.
    pub fn steps(&self) -> Option<&[String]> {
        self.custom.as_ref().map(|c| c.steps.as_slice())
    }

    /// The custom configurator, or `None` for the generic form.
    pub fn configurator(&self) -> Option<&Arc<dyn Configurator>> {
        self.custom.as_ref().map(|c| &c.configurator)
    }

    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// Number of wizard steps; the generic form is a single step.
    pub fn step_count(&self) -> usize {
        self.steps().map_or(1, |s| s.len())
    }
}

impl fmt::Debug for ConfiguratorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.custom {
            None => f.write_str("ConfiguratorDescriptor::Generic"),
            Some(c) => f
                .debug_struct("ConfiguratorDescriptor::Custom")
                .field("configurator", &c.configurator.name())
                .field("steps", &c.steps)
                .finish(),
        }
    }
}

/// Resolves the configurator for a connector type.
///
/// Must be idempotent. Implementations that fetch configurator code remotely
/// report fetch failures as `Err`; an unknown type is never an error.
#[async_trait]
pub trait ConfiguratorRegistry: Send + Sync {
    async fn resolve(&self, connector_type: &ConnectorType) -> Result<ConfiguratorDescriptor>;
}
