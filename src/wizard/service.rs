use super::event::{AttemptId, Command, ConfigChange, WizardEvent};
use super::machine::{WizardMachine, WizardParams, WizardStage};
use super::view::{project, WizardView};
use crate::auth::TokenProvider;
use crate::connector::Configuration;
use crate::loader::{ConfiguratorLoader, LoaderId};
use crate::registry::ConfiguratorRegistry;
use crate::submit::{self, ConnectorApi, SubmitRequest};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stage transition broadcast to observers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageChange {
    pub run_id: Uuid,
    pub from: WizardStage,
    pub to: WizardStage,
}

/// How a wizard run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardOutcome {
    Succeeded,
    Cancelled,
}

/// Sends UI events into a running wizard.
#[derive(Clone)]
pub struct WizardHandle {
    tx: mpsc::UnboundedSender<WizardEvent>,
}

impl WizardHandle {
    pub fn send(&self, event: WizardEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| anyhow!("wizard is no longer running"))
    }

    /// Reports an edit from the configurator loaded by `origin`.
    pub fn change(&self, origin: LoaderId, configuration: Configuration, is_valid: bool) -> Result<()> {
        self.send(WizardEvent::Change(ConfigChange {
            origin,
            configuration,
            is_valid,
        }))
    }
}

/// Event loop driving a [`WizardMachine`].
///
/// Events are applied one at a time. Loader and submission results come back
/// through the same queue as UI events.
pub struct WizardService {
    machine: WizardMachine,
    registry: Arc<dyn ConfiguratorRegistry>,
    api: Arc<dyn ConnectorApi>,
    loader_timeout: Option<Duration>,

    /// At most one live loader: the one for the current selection
    loader: Option<ConfiguratorLoader>,
    submission: Option<JoinHandle<()>>,

    events_tx: mpsc::UnboundedSender<WizardEvent>,
    events_rx: mpsc::UnboundedReceiver<WizardEvent>,
    stage_tx: broadcast::Sender<StageChange>,
}

impl WizardService {
    pub fn new(
        params: WizardParams,
        registry: Arc<dyn ConfiguratorRegistry>,
        api: Arc<dyn ConnectorApi>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stage_tx, _) = broadcast::channel(64);
        let machine = WizardMachine::new(params);

        info!(
            run_id = %machine.run_id(),
            edit = machine.context().mode().is_edit(),
            duplicate = machine.context().mode().is_duplicate(),
            "Wizard started"
        );

        Self {
            machine,
            registry,
            api,
            loader_timeout: Some(Duration::from_secs(30)),
            loader: None,
            submission: None,
            events_tx,
            events_rx,
            stage_tx,
        }
    }

    /// Sets the configurator resolution timeout (`None` waits forever).
    pub fn with_loader_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.loader_timeout = timeout;
        self
    }

    pub fn handle(&self) -> WizardHandle {
        WizardHandle {
            tx: self.events_tx.clone(),
        }
    }

    /// Subscribe to stage transitions
    pub fn subscribe(&self) -> broadcast::Receiver<StageChange> {
        self.stage_tx.subscribe()
    }

    pub fn machine(&self) -> &WizardMachine {
        &self.machine
    }

    pub fn view(&self) -> WizardView {
        project(&self.machine)
    }

    pub fn stage(&self) -> WizardStage {
        self.machine.stage()
    }

    /// Applies one event and runs the resulting commands.
    pub fn dispatch(&mut self, event: WizardEvent) -> WizardStage {
        let from = self.machine.stage();
        let commands = self.machine.send(event);
        for command in commands {
            self.execute(command);
        }

        let to = self.machine.stage();
        if from != to {
            // No subscribers is fine
            let _ = self.stage_tx.send(StageChange {
                run_id: self.machine.run_id(),
                from,
                to,
            });
        }
        to
    }

    /// Waits for the next queued event and applies it.
    pub async fn process_next(&mut self) -> Option<WizardStage> {
        let event = self.events_rx.recv().await?;
        Some(self.dispatch(event))
    }

    /// Applies the next queued event, if one is ready.
    pub fn try_process_next(&mut self) -> Option<WizardStage> {
        let event = self.events_rx.try_recv().ok()?;
        Some(self.dispatch(event))
    }

    /// Processes events until the wizard succeeds or is cancelled.
    pub async fn run(&mut self) -> WizardOutcome {
        loop {
            match self.process_next().await {
                Some(WizardStage::Succeeded) => return WizardOutcome::Succeeded,
                Some(WizardStage::Cancelled) => return WizardOutcome::Cancelled,
                Some(_) => {}
                // The service holds a sender, so the queue never closes
                None => return WizardOutcome::Cancelled,
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::SpawnLoader {
                loader,
                connector_type,
            } => {
                if let Some(previous) = self.loader.take() {
                    previous.destroy();
                }
                let mut new_loader = ConfiguratorLoader::new(loader, connector_type);
                new_loader.start(
                    Arc::clone(&self.registry),
                    self.events_tx.clone(),
                    self.loader_timeout,
                );
                self.loader = Some(new_loader);
            }
            Command::DestroyLoader { loader } => {
                if self.loader.as_ref().is_some_and(|l| l.id() == loader) {
                    if let Some(current) = self.loader.take() {
                        debug!(loader = %loader, "Destroying configurator loader");
                        current.destroy();
                    }
                }
            }
            Command::Submit { attempt, request } => self.spawn_submission(attempt, request),
        }
    }

    fn spawn_submission(&mut self, attempt: AttemptId, request: SubmitRequest) {
        if let Some(previous) = self.submission.take() {
            previous.abort();
        }

        let ctx = self.machine.context();
        let auth = Arc::clone(ctx.auth_token());
        let base_path = ctx.base_path().to_string();
        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        let run_id = self.machine.run_id();

        self.submission = Some(tokio::spawn(async move {
            let result = deliver(auth.as_ref(), api.as_ref(), &base_path, &request).await;

            let event = match result {
                Ok(()) => {
                    info!(
                        run_id = %run_id,
                        attempt = %attempt,
                        connector_id = request.connector_id().unwrap_or("new"),
                        "Connector saved"
                    );
                    WizardEvent::SubmitSucceeded { attempt }
                }
                Err(e) => {
                    warn!(run_id = %run_id, attempt = %attempt, error = %e, "Connector save failed");
                    WizardEvent::SubmitFailed {
                        attempt,
                        description: format!("{:#}", e),
                    }
                }
            };

            if events.send(event).is_err() {
                debug!(run_id = %run_id, attempt = %attempt, "Wizard gone, dropping submission result");
            }
        }));
    }
}

/// Fetches a fresh token and sends the request.
async fn deliver(
    auth: &dyn TokenProvider,
    api: &dyn ConnectorApi,
    base_path: &str,
    request: &SubmitRequest,
) -> Result<()> {
    let token = auth
        .token()
        .await
        .context("Failed to obtain access token")?;
    submit::submit(api, &token, base_path, request).await
}

impl Drop for WizardService {
    fn drop(&mut self) {
        if let Some(handle) = self.submission.take() {
            handle.abort();
        }
    }
}
