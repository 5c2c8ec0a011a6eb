//! Configurator loader - Resolves one connector type's configurator.
//!
//! The wizard spawns one loader per connector-type selection. The loader
//! resolves the registry entry on a background task and posts the outcome on
//! the wizard's event queue, tagged with its [`LoaderId`] so that a result
//! arriving after the wizard moved on can be recognised and dropped.
//!
//! # States
//!
//! ```text
//! Idle ──start──▶ Loading ──▶ Ready
//!                    │
//!                    └──────▶ Failed(cause)
//! ```
//!
//! `Ready` and `Failed` are terminal. Retrying means spawning a new loader.

use crate::connector::ConnectorType;
use crate::registry::ConfiguratorRegistry;
use crate::wizard::WizardEvent;
use anyhow::anyhow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Identifies one loader instance within a wizard run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(pub u64);

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader-{}", self.0)
    }
}

/// Lifecycle of a loader.
#[derive(Clone, Debug, PartialEq)]
pub enum LoaderState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoaderState::Ready | LoaderState::Failed(_))
    }
}

/// Child unit resolving a configurator for one connector type.
///
/// Dropping the loader aborts an in-flight resolution.
pub struct ConfiguratorLoader {
    id: LoaderId,
    connector_type: ConnectorType,
    state_tx: watch::Sender<LoaderState>,
    handle: Option<JoinHandle<()>>,
}

impl ConfiguratorLoader {
    pub fn new(id: LoaderId, connector_type: ConnectorType) -> Self {
        let (state_tx, _) = watch::channel(LoaderState::Idle);
        Self {
            id,
            connector_type,
            state_tx,
            handle: None,
        }
    }

    pub fn id(&self) -> LoaderId {
        self.id
    }

    pub fn connector_type(&self) -> &ConnectorType {
        &self.connector_type
    }

    pub fn state(&self) -> LoaderState {
        self.state_tx.borrow().clone()
    }

    /// Watches state changes (for monitoring and tests).
    pub fn watch(&self) -> watch::Receiver<LoaderState> {
        self.state_tx.subscribe()
    }

    /// Starts resolution (non-blocking).
    ///
    /// Only valid from `Idle`; later calls are ignored. With a `timeout`, a
    /// resolution that does not finish in time fails with a timeout cause.
    pub fn start(
        &mut self,
        registry: Arc<dyn ConfiguratorRegistry>,
        events: mpsc::UnboundedSender<WizardEvent>,
        timeout: Option<Duration>,
    ) {
        if *self.state_tx.borrow() != LoaderState::Idle {
            warn!(loader = %self.id, "Loader already started, ignoring start");
            return;
        }
        self.state_tx.send_replace(LoaderState::Loading);

        let id = self.id;
        let connector_type = self.connector_type.clone();
        let state_tx = self.state_tx.clone();

        info!(loader = %id, connector_type = %connector_type.id, "Loading configurator");

        self.handle = Some(tokio::spawn(async move {
            let resolution = registry.resolve(&connector_type);
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, resolution).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!(
                        "configurator resolution timed out after {}s",
                        limit.as_secs()
                    )),
                },
                None => resolution.await,
            };

            let event = match result {
                Ok(descriptor) => {
                    info!(
                        loader = %id,
                        connector_type = %connector_type.id,
                        custom = descriptor.is_custom(),
                        steps = descriptor.step_count(),
                        "Configurator ready"
                    );
                    state_tx.send_replace(LoaderState::Ready);
                    WizardEvent::ConfiguratorReady {
                        loader: id,
                        descriptor,
                    }
                }
                Err(e) => {
                    let cause = format!("{:#}", e);
                    warn!(
                        loader = %id,
                        connector_type = %connector_type.id,
                        error = %cause,
                        "Configurator resolution failed"
                    );
                    state_tx.send_replace(LoaderState::Failed(cause.clone()));
                    WizardEvent::ConfiguratorFailed { loader: id, cause }
                }
            };

            // The wizard may already be gone; nothing to deliver to then.
            if events.send(event).is_err() {
                debug!(loader = %id, "Wizard event queue closed, dropping loader result");
            }
        }));
    }

    /// Destroys the loader, cancelling any in-flight resolution.
    pub fn destroy(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!(loader = %self.id, "Aborting in-flight configurator resolution");
            }
            handle.abort();
        }
    }
}

impl Drop for ConfiguratorLoader {
    fn drop(&mut self) {
        self.abort();
    }
}
