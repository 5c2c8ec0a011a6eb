//! Connector configuration wizard.
//!
//! # Architecture
//!
//! ```text
//!   UI (custom configurator or generic form)
//!          │ WizardEvent (select, change, next, submit, ...)
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │       WizardService (event loop)         │
//! │  - one event at a time                   │
//! │  - owns loader and submission tasks      │
//! └─────────────────────────────────────────┘
//!          │ send(event) -> Vec<Command>
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │       WizardMachine (pure transitions)   │
//! │  - stage + context                       │
//! │  - drops stale async results             │
//! └─────────────────────────────────────────┘
//!          │
//!          ▼
//!   project(machine) -> WizardView
//! ```

mod event;
mod machine;
mod service;
mod view;


pub use event::{AttemptId, Command, ConfigChange, WizardEvent};
pub use machine::{
    FailureKind, WizardContext, WizardFailure, WizardMachine, WizardMode, WizardParams,
    WizardStage,
};
pub use service::{StageChange, WizardHandle, WizardOutcome, WizardService};
pub use view::{project, ConfiguratorView, WizardView};
