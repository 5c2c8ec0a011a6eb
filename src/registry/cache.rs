use super::{ConfiguratorDescriptor, ConfiguratorRegistry};
use crate::connector::ConnectorType;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Memoizes successful resolutions of an inner registry.
///
/// Failures are not cached, so a later selection of the same type retries
/// the inner registry.
pub struct CachingRegistry<R> {
    inner: R,
    cache: DashMap<String, ConfiguratorDescriptor>,
}

impl<R: ConfiguratorRegistry> CachingRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of cached descriptors.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn invalidate(&self, type_id: &str) {
        self.cache.remove(type_id);
    }
}

#[async_trait]
impl<R: ConfiguratorRegistry> ConfiguratorRegistry for CachingRegistry<R> {
    async fn resolve(&self, connector_type: &ConnectorType) -> Result<ConfiguratorDescriptor> {
        if let Some(hit) = self.cache.get(&connector_type.id) {
            debug!(connector_type = %connector_type.id, "Configurator cache hit");
            return Ok(hit.clone());
        }

        let descriptor = self.inner.resolve(connector_type).await?;
        self.cache.insert(connector_type.id.clone(), descriptor.clone());
        Ok(descriptor)
    }
}
