use super::*;
use anyhow::anyhow;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

struct StepsConfigurator;

impl Configurator for StepsConfigurator {
    fn name(&self) -> &str {
        "steps"
    }

    fn render(&self, props: &ConfiguratorProps<'_>) -> Value {
        json!({"step": props.active_step, "connector": props.connector_type.id})
    }
}

fn steps(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

fn sample_registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new();
    registry
        .register(
            "aws-kinesis-source",
            steps(&["First step", "Second step", "Third step"]),
            Arc::new(StepsConfigurator),
        )
        .unwrap()
        .register_family(
            "streaming-capture",
            steps(&["Properties", "Filter Configuration", "Data Options", "Runtime Options"]),
            Arc::new(StepsConfigurator),
        )
        .unwrap();
    registry
}

fn assert_pairing(descriptor: &ConfiguratorDescriptor) {
    assert_eq!(descriptor.steps().is_none(), descriptor.configurator().is_none());
    if let Some(s) = descriptor.steps() {
        assert!(!s.is_empty());
    }
}

#[test]
fn test_custom_descriptor_rejects_empty_steps() {
    let result = ConfiguratorDescriptor::custom(vec![], Arc::new(StepsConfigurator));
    assert_eq!(result.unwrap_err(), DescriptorError::NoSteps("steps".to_string()));
}

#[test]
fn test_custom_descriptor_rejects_blank_step() {
    let result =
        ConfiguratorDescriptor::custom(steps(&["Properties", "  "]), Arc::new(StepsConfigurator));
    assert_eq!(
        result.unwrap_err(),
        DescriptorError::BlankStep {
            configurator: "steps".to_string(),
            index: 1
        }
    );
}

#[test]
fn test_generic_descriptor_is_single_step() {
    let d = ConfiguratorDescriptor::generic();
    assert!(!d.is_custom());
    assert_eq!(d.step_count(), 1);
    assert_pairing(&d);
}

#[tokio::test]
async fn test_resolve_by_id() {
    let registry = sample_registry();
    let d = registry
        .resolve(&ConnectorType::new("aws-kinesis-source"))
        .await
        .unwrap();
    assert!(d.is_custom());
    assert_eq!(d.step_count(), 3);
    assert_eq!(d.steps().unwrap()[0], "First step");
}

#[tokio::test]
async fn test_resolve_by_family() {
    let registry = sample_registry();
    let ct = ConnectorType::new("debezium-postgres-1.9").with_family("streaming-capture");
    let d = registry.resolve(&ct).await.unwrap();
    assert_eq!(d.step_count(), 4);
}

#[tokio::test]
async fn test_unknown_type_resolves_to_generic() {
    let registry = sample_registry();
    let d = registry
        .resolve(&ConnectorType::new("http-sink"))
        .await
        .unwrap();
    assert!(!d.is_custom());
    assert!(d.steps().is_none());
}

#[tokio::test]
async fn test_pairing_invariant_for_random_ids() {
    let registry = sample_registry();
    let mut ids: Vec<String> = (0..50).map(|_| uuid::Uuid::new_v4().to_string()).collect();
    ids.push("aws-kinesis-source".to_string());

    for id in ids {
        let d = registry.resolve(&ConnectorType::new(id.clone())).await.unwrap();
        assert_pairing(&d);

        let with_family = ConnectorType::new(id).with_family("streaming-capture");
        assert_pairing(&registry.resolve(&with_family).await.unwrap());
    }
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let registry = sample_registry();
    let ct = ConnectorType::new("aws-kinesis-source");
    let first = registry.resolve(&ct).await.unwrap();
    let second = registry.resolve(&ct).await.unwrap();
    assert_eq!(first.steps(), second.steps());
}

struct CountingRegistry {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ConfiguratorRegistry for CountingRegistry {
    async fn resolve(&self, _connector_type: &ConnectorType) -> Result<ConfiguratorDescriptor> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("remote entry unreachable"));
        }
        Ok(ConfiguratorDescriptor::generic())
    }
}

#[tokio::test]
async fn test_caching_registry_memoizes_success() {
    let cache = CachingRegistry::new(CountingRegistry {
        calls: AtomicUsize::new(0),
        fail: false,
    });
    let ct = ConnectorType::new("http-sink");

    cache.resolve(&ct).await.unwrap();
    cache.resolve(&ct).await.unwrap();

    assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.cached(), 1);

    cache.invalidate("http-sink");
    cache.resolve(&ct).await.unwrap();
    assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_caching_registry_does_not_cache_failures() {
    let cache = CachingRegistry::new(CountingRegistry {
        calls: AtomicUsize::new(0),
        fail: true,
    });
    let ct = ConnectorType::new("http-sink");

    assert!(cache.resolve(&ct).await.is_err());
    assert!(cache.resolve(&ct).await.is_err());
    assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.cached(), 0);
}
