use super::event::{AttemptId, Command, ConfigChange, WizardEvent};
use crate::auth::TokenProvider;
use crate::connector::{Configuration, ConnectorInstance, ConnectorType};
use crate::diff::{diff, merge_for_duplicate};
use crate::loader::LoaderId;
use crate::registry::ConfiguratorDescriptor;
use crate::state::ConfigurationStore;
use crate::submit::{CreateRequest, SubmitRequest, UpdateRequest};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Wizard lifecycle stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    SelectingType,
    /// `configureConnector.loadConfigurator`
    LoadingConfigurator,
    /// `configureConnector.configuring`
    Configuring,
    Reviewing,
    Submitting,
    Succeeded,
    Failure,
    Cancelled,
}

impl WizardStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, WizardStage::Succeeded | WizardStage::Cancelled)
    }

    /// Stages from which the user may still abort.
    fn is_cancellable(self) -> bool {
        matches!(
            self,
            WizardStage::SelectingType
                | WizardStage::LoadingConfigurator
                | WizardStage::Configuring
                | WizardStage::Reviewing
                | WizardStage::Failure
        )
    }

    /// Stages accepting a connector-type (re)selection.
    fn accepts_selection(self) -> bool {
        self.is_cancellable()
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStage::SelectingType => "selecting_type",
            WizardStage::LoadingConfigurator => "configure_connector.load_configurator",
            WizardStage::Configuring => "configure_connector.configuring",
            WizardStage::Reviewing => "reviewing",
            WizardStage::Submitting => "submitting",
            WizardStage::Succeeded => "succeeded",
            WizardStage::Failure => "failure",
            WizardStage::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// What the wizard run does with the configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum WizardMode {
    /// New connector from scratch
    Create,
    /// Patch an existing connector
    Edit(ConnectorInstance),
    /// New connector pre-filled from an existing one
    Duplicate(ConnectorInstance),
}

impl WizardMode {
    /// Connector used as baseline, if any.
    pub fn instance(&self) -> Option<&ConnectorInstance> {
        match self {
            WizardMode::Create => None,
            WizardMode::Edit(i) | WizardMode::Duplicate(i) => Some(i),
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, WizardMode::Edit(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, WizardMode::Duplicate(_))
    }
}

/// Which collaborator failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Configurator could not be resolved
    Resolution,
    /// Connector API rejected the submission
    Submission,
}

/// User-visible failure.
#[derive(Clone, Debug, PartialEq)]
pub struct WizardFailure {
    pub kind: FailureKind,
    pub description: String,
}

impl fmt::Display for WizardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Resolution => {
                write!(f, "failed to load configurator: {}", self.description)
            }
            FailureKind::Submission => write!(f, "failed to save connector: {}", self.description),
        }
    }
}

impl std::error::Error for WizardFailure {}

/// Construction parameters supplied by the embedding application.
#[derive(Clone)]
pub struct WizardParams {
    pub auth_token: Arc<dyn TokenProvider>,
    pub base_path: String,
    pub mode: WizardMode,
}

/// Working memory of a wizard run.
#[derive(Clone)]
pub struct WizardContext {
    auth_token: Arc<dyn TokenProvider>,
    base_path: String,
    mode: WizardMode,
    connector_type: Option<ConnectorType>,
    active_step: usize,
    descriptor: Option<ConfiguratorDescriptor>,
    store: ConfigurationStore,
    name: Option<String>,
    failure: Option<WizardFailure>,
}

impl WizardContext {
    pub fn auth_token(&self) -> &Arc<dyn TokenProvider> {
        &self.auth_token
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn mode(&self) -> &WizardMode {
        &self.mode
    }

    pub fn connector_type(&self) -> Option<&ConnectorType> {
        self.connector_type.as_ref()
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    /// `None` while the configurator is loading.
    pub fn descriptor(&self) -> Option<&ConfiguratorDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn store(&self) -> &ConfigurationStore {
        &self.store
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn failure(&self) -> Option<&WizardFailure> {
        self.failure.as_ref()
    }

    /// Steps of the resolved configurator; the generic form counts as one.
    pub fn step_count(&self) -> usize {
        self.descriptor.as_ref().map_or(1, |d| d.step_count())
    }

    pub fn all_steps_valid(&self) -> bool {
        self.descriptor.is_some() && self.store.all_steps_valid(self.step_count())
    }

    /// User values overlaid on the duplicate source, limited to the keys the
    /// selected type declares.
    pub fn merged_configuration(&self) -> Configuration {
        let mut merged = merge_for_duplicate(self.store.configuration(), self.store.baseline());
        if let Some(connector_type) = &self.connector_type {
            connector_type.retain_schema_keys(&mut merged);
        }
        merged
    }
}

/// Wizard state machine.
///
/// Pure and synchronous: [`WizardMachine::send`] applies one event and
/// returns the side effects the caller must perform. Asynchronous results
/// re-enter as events tagged with the loader or attempt that produced them;
/// results from anything but the current loader/attempt are dropped.
pub struct WizardMachine {
    run_id: Uuid,
    stage: WizardStage,
    context: WizardContext,
    current_loader: Option<LoaderId>,
    loader_seq: u64,
    current_attempt: Option<AttemptId>,
    attempt_seq: u64,
}

impl WizardMachine {
    pub fn new(params: WizardParams) -> Self {
        let mut store = ConfigurationStore::new();
        if let Some(instance) = params.mode.instance() {
            store.capture_baseline(instance.connector.clone());
        }
        let name = match &params.mode {
            WizardMode::Edit(instance) => Some(instance.name.clone()),
            _ => None,
        };

        Self {
            run_id: Uuid::now_v7(),
            stage: WizardStage::SelectingType,
            context: WizardContext {
                auth_token: params.auth_token,
                base_path: params.base_path,
                mode: params.mode,
                connector_type: None,
                active_step: 0,
                descriptor: None,
                store,
                name,
                failure: None,
            },
            current_loader: None,
            loader_seq: 0,
            current_attempt: None,
            attempt_seq: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn context(&self) -> &WizardContext {
        &self.context
    }

    /// Loader whose results and changes are currently accepted.
    pub fn current_loader(&self) -> Option<LoaderId> {
        self.current_loader
    }

    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.current_attempt
    }

    /// Applies one event. Returns the commands to execute, in order.
    pub fn send(&mut self, event: WizardEvent) -> Vec<Command> {
        debug!(run_id = %self.run_id, stage = %self.stage, event = event.kind(), "Wizard event");

        match event {
            WizardEvent::SelectType(connector_type) => self.select_type(connector_type),
            WizardEvent::ConfiguratorReady { loader, descriptor } => {
                self.configurator_ready(loader, descriptor);
                Vec::new()
            }
            WizardEvent::ConfiguratorFailed { loader, cause } => {
                self.configurator_failed(loader, cause);
                Vec::new()
            }
            WizardEvent::Change(change) => {
                self.change(change);
                Vec::new()
            }
            WizardEvent::Next => {
                self.next();
                Vec::new()
            }
            WizardEvent::Previous => {
                self.previous();
                Vec::new()
            }
            WizardEvent::GoTo(step) => {
                self.go_to(step);
                Vec::new()
            }
            WizardEvent::SetName(name) => {
                self.set_name(name);
                Vec::new()
            }
            WizardEvent::Submit => self.submit(),
            WizardEvent::SubmitSucceeded { attempt } => self.submit_succeeded(attempt),
            WizardEvent::SubmitFailed {
                attempt,
                description,
            } => {
                self.submit_failed(attempt, description);
                Vec::new()
            }
            WizardEvent::Retry => {
                self.retry();
                Vec::new()
            }
            WizardEvent::Cancel => self.cancel(),
        }
    }

    fn transition(&mut self, to: WizardStage) {
        if self.stage == to {
            return;
        }
        info!(run_id = %self.run_id, from = %self.stage, to = %to, "Wizard transition");
        self.stage = to;
    }

    fn destroy_current_loader(&mut self, commands: &mut Vec<Command>) {
        if let Some(loader) = self.current_loader.take() {
            commands.push(Command::DestroyLoader { loader });
        }
    }

    fn select_type(&mut self, connector_type: ConnectorType) -> Vec<Command> {
        if !self.stage.accepts_selection() {
            warn!(
                run_id = %self.run_id,
                stage = %self.stage,
                connector_type = %connector_type.id,
                "Connector type selection rejected in this stage"
            );
            return Vec::new();
        }

        if let Some(instance) = self.context.mode.instance() {
            if instance.connector_type_id != connector_type.id {
                warn!(
                    run_id = %self.run_id,
                    expected = %instance.connector_type_id,
                    selected = %connector_type.id,
                    "Connector type is fixed when editing or duplicating"
                );
                return Vec::new();
            }
        }

        let same_type = self
            .context
            .connector_type
            .as_ref()
            .is_some_and(|current| current.id == connector_type.id);
        let resolution_failed = self
            .context
            .failure
            .as_ref()
            .is_some_and(|f| f.kind == FailureKind::Resolution);
        if same_type && !resolution_failed {
            debug!(
                run_id = %self.run_id,
                connector_type = %connector_type.id,
                "Same connector type reselected"
            );
            return Vec::new();
        }

        let mut commands = Vec::new();
        self.destroy_current_loader(&mut commands);

        self.context.store.reset_for_type(&connector_type);
        self.context.active_step = 0;
        self.context.descriptor = None;
        self.context.failure = None;
        self.context.connector_type = Some(connector_type.clone());
        self.current_attempt = None;

        self.loader_seq += 1;
        let loader = LoaderId(self.loader_seq);
        self.current_loader = Some(loader);

        info!(
            run_id = %self.run_id,
            loader = %loader,
            connector_type = %connector_type.id,
            "Connector type selected"
        );
        self.transition(WizardStage::LoadingConfigurator);

        commands.push(Command::SpawnLoader {
            loader,
            connector_type,
        });
        commands
    }

    fn is_current_loader(&self, loader: LoaderId) -> bool {
        self.current_loader == Some(loader)
    }

    fn configurator_ready(&mut self, loader: LoaderId, descriptor: ConfiguratorDescriptor) {
        if self.stage != WizardStage::LoadingConfigurator || !self.is_current_loader(loader) {
            debug!(run_id = %self.run_id, loader = %loader, "Dropping stale configurator result");
            return;
        }

        // Edit and duplicate runs start from the baseline, limited to the
        // keys the selected type declares.
        if let (Some(baseline), Some(connector_type)) = (
            self.context.store.baseline(),
            self.context.connector_type.as_ref(),
        ) {
            let mut seeded = merge_for_duplicate(self.context.store.configuration(), Some(baseline));
            connector_type.retain_schema_keys(&mut seeded);
            self.context.store.set_configuration(seeded);
        }

        self.context.descriptor = Some(descriptor);
        self.transition(WizardStage::Configuring);
    }

    fn configurator_failed(&mut self, loader: LoaderId, cause: String) {
        if self.stage != WizardStage::LoadingConfigurator || !self.is_current_loader(loader) {
            debug!(run_id = %self.run_id, loader = %loader, "Dropping stale configurator failure");
            return;
        }

        self.context.failure = Some(WizardFailure {
            kind: FailureKind::Resolution,
            description: cause,
        });
        self.transition(WizardStage::Failure);
    }

    fn change(&mut self, change: ConfigChange) {
        if self.stage != WizardStage::Configuring || !self.is_current_loader(change.origin) {
            debug!(
                run_id = %self.run_id,
                origin = %change.origin,
                stage = %self.stage,
                "Dropping change from inactive configurator"
            );
            return;
        }

        let step = self.context.active_step;
        self.context.store.set_configuration(change.configuration);
        self.context.store.set_step_validity(step, change.is_valid);
    }

    fn next(&mut self) {
        if self.stage != WizardStage::Configuring {
            return;
        }

        let step = self.context.active_step;
        if !self.context.store.is_step_valid(step) {
            debug!(run_id = %self.run_id, step = step, "Next blocked: step is invalid");
            return;
        }

        if step + 1 < self.context.step_count() {
            self.context.active_step = step + 1;
        } else if self.context.all_steps_valid() {
            self.transition(WizardStage::Reviewing);
        } else {
            debug!(run_id = %self.run_id, "Review blocked: not every step is valid");
        }
    }

    fn previous(&mut self) {
        match self.stage {
            WizardStage::Configuring if self.context.active_step > 0 => {
                self.context.active_step -= 1;
            }
            WizardStage::Reviewing => self.transition(WizardStage::Configuring),
            _ => {}
        }
    }

    fn go_to(&mut self, step: usize) {
        if self.stage != WizardStage::Configuring {
            return;
        }
        if step >= self.context.step_count() {
            warn!(
                run_id = %self.run_id,
                step = step,
                step_count = self.context.step_count(),
                "Step index out of range"
            );
            return;
        }
        self.context.active_step = step;
    }

    fn set_name(&mut self, name: String) {
        if matches!(self.stage, WizardStage::Configuring | WizardStage::Reviewing) {
            self.context.name = Some(name);
        }
    }

    /// Builds the request for the current mode.
    fn submit_request(&self, connector_type: &ConnectorType) -> SubmitRequest {
        let store = &self.context.store;
        match &self.context.mode {
            WizardMode::Edit(instance) => SubmitRequest::Update(UpdateRequest {
                connector_id: instance.id.clone(),
                connector: diff(store.configuration(), store.baseline()),
                updated_name: self
                    .context
                    .name
                    .clone()
                    .filter(|name| *name != instance.name),
            }),
            WizardMode::Duplicate(_) => SubmitRequest::Create(CreateRequest {
                connector_type_id: connector_type.id.clone(),
                name: self.context.name.clone(),
                connector: self.context.merged_configuration(),
            }),
            WizardMode::Create => SubmitRequest::Create(CreateRequest {
                connector_type_id: connector_type.id.clone(),
                name: self.context.name.clone(),
                connector: store.configuration().clone(),
            }),
        }
    }

    fn submit(&mut self) -> Vec<Command> {
        if !matches!(self.stage, WizardStage::Configuring | WizardStage::Reviewing) {
            debug!(run_id = %self.run_id, stage = %self.stage, "Submit ignored in this stage");
            return Vec::new();
        }
        if !self.context.all_steps_valid() {
            debug!(run_id = %self.run_id, "Submit blocked: not every step is valid");
            return Vec::new();
        }
        let Some(connector_type) = self.context.connector_type.as_ref() else {
            return Vec::new();
        };

        let request = self.submit_request(connector_type);
        self.attempt_seq += 1;
        let attempt = AttemptId(self.attempt_seq);
        self.current_attempt = Some(attempt);

        info!(
            run_id = %self.run_id,
            attempt = %attempt,
            edit = self.context.mode.is_edit(),
            keys = request.payload().len(),
            "Submitting connector"
        );
        self.transition(WizardStage::Submitting);

        vec![Command::Submit { attempt, request }]
    }

    fn is_current_attempt(&self, attempt: AttemptId) -> bool {
        self.stage == WizardStage::Submitting && self.current_attempt == Some(attempt)
    }

    fn submit_succeeded(&mut self, attempt: AttemptId) -> Vec<Command> {
        if !self.is_current_attempt(attempt) {
            debug!(run_id = %self.run_id, attempt = %attempt, "Dropping stale submission result");
            return Vec::new();
        }

        let mut commands = Vec::new();
        self.destroy_current_loader(&mut commands);
        self.current_attempt = None;
        self.transition(WizardStage::Succeeded);
        commands
    }

    fn submit_failed(&mut self, attempt: AttemptId, description: String) {
        if !self.is_current_attempt(attempt) {
            debug!(run_id = %self.run_id, attempt = %attempt, "Dropping stale submission failure");
            return;
        }

        warn!(run_id = %self.run_id, attempt = %attempt, error = %description, "Submission failed");
        self.current_attempt = None;
        self.context.failure = Some(WizardFailure {
            kind: FailureKind::Submission,
            description,
        });
        self.transition(WizardStage::Failure);
    }

    fn retry(&mut self) {
        let retryable = self.stage == WizardStage::Failure
            && self
                .context
                .failure
                .as_ref()
                .is_some_and(|f| f.kind == FailureKind::Submission);
        if !retryable {
            debug!(run_id = %self.run_id, stage = %self.stage, "Retry ignored");
            return;
        }

        self.context.failure = None;
        self.transition(WizardStage::Reviewing);
    }

    fn cancel(&mut self) -> Vec<Command> {
        if !self.stage.is_cancellable() {
            debug!(run_id = %self.run_id, stage = %self.stage, "Cancel ignored in this stage");
            return Vec::new();
        }

        let mut commands = Vec::new();
        self.destroy_current_loader(&mut commands);
        self.transition(WizardStage::Cancelled);
        commands
    }
}
