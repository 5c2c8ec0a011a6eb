use super::{Configurator, ConfiguratorDescriptor, ConfiguratorRegistry, DescriptorError};
use crate::connector::ConnectorType;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// In-process registry.
///
/// Looks a connector type up by id first, then by family. Anything else gets
/// the generic form.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    by_id: HashMap<String, ConfiguratorDescriptor>,
    by_family: HashMap<String, ConfiguratorDescriptor>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom configurator for one connector type id.
    pub fn register(
        &mut self,
        type_id: impl Into<String>,
        steps: Vec<String>,
        configurator: Arc<dyn Configurator>,
    ) -> Result<&mut Self, DescriptorError> {
        let descriptor = ConfiguratorDescriptor::custom(steps, configurator)?;
        self.by_id.insert(type_id.into(), descriptor);
        Ok(self)
    }

    /// Registers a custom configurator for every type of a family.
    pub fn register_family(
        &mut self,
        family: impl Into<String>,
        steps: Vec<String>,
        configurator: Arc<dyn Configurator>,
    ) -> Result<&mut Self, DescriptorError> {
        let descriptor = ConfiguratorDescriptor::custom(steps, configurator)?;
        self.by_family.insert(family.into(), descriptor);
        Ok(self)
    }

    /// Synchronous lookup used by [`ConfiguratorRegistry::resolve`].
    pub fn lookup(&self, connector_type: &ConnectorType) -> ConfiguratorDescriptor {
        if let Some(d) = self.by_id.get(&connector_type.id) {
            return d.clone();
        }
        if let Some(d) = connector_type
            .family
            .as_ref()
            .and_then(|family| self.by_family.get(family))
        {
            return d.clone();
        }
        debug!(connector_type = %connector_type.id, "No custom configurator, using generic form");
        ConfiguratorDescriptor::generic()
    }
}

#[async_trait]
impl ConfiguratorRegistry for StaticRegistry {
    async fn resolve(&self, connector_type: &ConnectorType) -> Result<ConfiguratorDescriptor> {
        Ok(self.lookup(connector_type))
    }
}
