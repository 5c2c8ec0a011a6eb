use crate::connector::{Configuration, ConnectorType};
use crate::loader::LoaderId;
use crate::registry::ConfiguratorDescriptor;
use crate::submit::SubmitRequest;
use std::fmt;

/// Identifies one submission attempt within a wizard run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// Edit reported by the active configuration UI.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigChange {
    /// Loader whose configurator emitted the change
    pub origin: LoaderId,
    pub configuration: Configuration,
    pub is_valid: bool,
}

/// Input to the wizard state machine.
#[derive(Clone, Debug)]
pub enum WizardEvent {
    /// User picked a connector type
    SelectType(ConnectorType),
    /// Loader resolved a descriptor
    ConfiguratorReady {
        loader: LoaderId,
        descriptor: ConfiguratorDescriptor,
    },
    /// Loader could not resolve a descriptor
    ConfiguratorFailed { loader: LoaderId, cause: String },
    Change(ConfigChange),
    Next,
    Previous,
    GoTo(usize),
    SetName(String),
    Submit,
    SubmitSucceeded { attempt: AttemptId },
    SubmitFailed {
        attempt: AttemptId,
        description: String,
    },
    /// Return to review after a failed submission
    Retry,
    Cancel,
}

impl WizardEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WizardEvent::SelectType(_) => "select_type",
            WizardEvent::ConfiguratorReady { .. } => "configurator_ready",
            WizardEvent::ConfiguratorFailed { .. } => "configurator_failed",
            WizardEvent::Change(_) => "change",
            WizardEvent::Next => "next",
            WizardEvent::Previous => "previous",
            WizardEvent::GoTo(_) => "go_to",
            WizardEvent::SetName(_) => "set_name",
            WizardEvent::Submit => "submit",
            WizardEvent::SubmitSucceeded { .. } => "submit_succeeded",
            WizardEvent::SubmitFailed { .. } => "submit_failed",
            WizardEvent::Retry => "retry",
            WizardEvent::Cancel => "cancel",
        }
    }
}

/// Side effect requested by a transition, executed by the service.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SpawnLoader {
        loader: LoaderId,
        connector_type: ConnectorType,
    },
    DestroyLoader { loader: LoaderId },
    Submit {
        attempt: AttemptId,
        request: SubmitRequest,
    },
}
