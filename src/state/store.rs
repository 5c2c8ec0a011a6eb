use crate::connector::{Configuration, ConnectorType};
use std::collections::BTreeMap;
use tracing::debug;

/// Working configuration, baseline snapshot and per-step validity.
///
/// Only the wizard state machine mutates the store, so the custom
/// configurator and the generic form always read the same copy.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationStore {
    /// Current configuration (single source of truth)
    configuration: Configuration,

    /// Persisted values (edit) or source values (duplicate); immutable once captured
    baseline: Option<Configuration>,

    /// Step index -> validity reported by the active UI
    step_validity: BTreeMap<usize, bool>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a baseline captured at wizard entry.
    pub fn with_baseline(baseline: Configuration) -> Self {
        Self {
            baseline: Some(baseline),
            ..Self::default()
        }
    }

    /// Records the baseline. Later captures are ignored.
    pub fn capture_baseline(&mut self, baseline: Configuration) {
        if self.baseline.is_some() {
            debug!("Baseline already captured, ignoring");
            return;
        }
        self.baseline = Some(baseline);
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn baseline(&self) -> Option<&Configuration> {
        self.baseline.as_ref()
    }

    /// Replaces the whole configuration (no merge).
    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    pub fn set_step_validity(&mut self, step: usize, valid: bool) {
        self.step_validity.insert(step, valid);
    }

    /// Validity of one step; steps that never reported are invalid.
    pub fn is_step_valid(&self, step: usize) -> bool {
        self.step_validity.get(&step).copied().unwrap_or(false)
    }

    /// True when each of the first `step_count` steps reported valid.
    pub fn all_steps_valid(&self, step_count: usize) -> bool {
        step_count > 0 && (0..step_count).all(|step| self.is_step_valid(step))
    }

    /// Clears configuration and validity for a newly selected type.
    ///
    /// The baseline survives: it belongs to the wizard run, not the type.
    pub fn reset_for_type(&mut self, connector_type: &ConnectorType) {
        debug!(
            connector_type = %connector_type.id,
            dropped_keys = self.configuration.len(),
            "Resetting configuration for connector type"
        );
        self.configuration.clear();
        self.step_validity.clear();
    }
}
