//! Data types for provider actions.

use std::sync::Arc;

use thiserror::Error;

use crate::capture::{CaptureError, CaptureMode};
use crate::dispatch::DispatchError;
use crate::provider::Provider;
use crate::template::ExtractionError;

/// What started an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTrigger {
    /// One of the screenshot menus; only valid for upload providers.
    Capture(CaptureMode),
    /// The tools menu; only valid for providers without a file form.
    Tool,
}

/// Result of a successful action.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub provider: Arc<Provider>,
    /// The extracted result that was copied to the clipboard.
    pub result: String,
}

/// Errors that abort a single action. None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("No provider named '{0}'")]
    UnknownProvider(String),

    #[error("Provider '{provider}' cannot be run from {trigger:?}")]
    WrongTrigger {
        provider: String,
        trigger: ActionTrigger,
    },

    #[error("Action task failed: {0}")]
    Join(String),

    #[error("Action manager not running")]
    ManagerStopped,
}

impl ActionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ActionError::Dispatch(DispatchError::Cancelled))
    }
}

/// Status of the action worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Idle,
    /// Running an action for the named provider.
    Running(String),
    /// Last action finished with this result.
    Finished(String),
    Failed(String),
    Cancelled,
}
