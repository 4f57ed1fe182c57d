use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, mpsc};

use crate::action::{
    dependencies::ActionDependencies,
    runner::perform_action,
    types::{ActionError, ActionStatus, ActionTrigger},
};
use crate::dispatch::CancelToken;
use crate::provider::Provider;

struct ActionRequest {
    provider: Arc<Provider>,
    trigger: ActionTrigger,
}

/// Runs actions one at a time on a background task.
///
/// Menu callbacks only enqueue requests, so they never block on capture,
/// prompts or the network. Requests are processed strictly in order.
#[derive(Clone)]
pub struct ActionManager {
    request_tx: mpsc::UnboundedSender<ActionRequest>,
    status: Arc<Mutex<ActionStatus>>,
    /// Cancellation handle of the action currently running, if any.
    current: Arc<StdMutex<Option<CancelToken>>>,
}

impl ActionManager {
    /// Create a manager whose worker runs on `runtime_handle`.
    pub fn new(runtime_handle: &tokio::runtime::Handle, dependencies: ActionDependencies) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<ActionRequest>();
        let status = Arc::new(Mutex::new(ActionStatus::Idle));
        let current: Arc<StdMutex<Option<CancelToken>>> = Arc::new(StdMutex::new(None));
        let dependencies = Arc::new(dependencies);

        let status_clone = status.clone();
        let current_clone = current.clone();

        runtime_handle.spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let name = request.provider.name.clone();
                log::debug!("Processing action request: {} ({:?})", name, request.trigger);

                let cancel = CancelToken::new();
                set_current(&current_clone, Some(cancel.clone()));
                *status_clone.lock().await = ActionStatus::Running(name.clone());

                let status = match perform_action(
                    request.provider,
                    request.trigger,
                    dependencies.clone(),
                    cancel,
                )
                .await
                {
                    Ok(outcome) => ActionStatus::Finished(outcome.result),
                    Err(err) if err.is_cancelled() => {
                        log::info!("Action '{}' cancelled", name);
                        ActionStatus::Cancelled
                    }
                    Err(err) => {
                        log::error!("Action '{}' failed: {}", name, err);
                        ActionStatus::Failed(err.to_string())
                    }
                };

                set_current(&current_clone, None);
                *status_clone.lock().await = status;
            }
        });

        Self {
            request_tx,
            status,
            current,
        }
    }

    /// Queue an action. Returns immediately.
    pub fn request(&self, provider: Arc<Provider>, trigger: ActionTrigger) -> Result<(), ActionError> {
        self.request_tx
            .send(ActionRequest { provider, trigger })
            .map_err(|_| ActionError::ManagerStopped)
    }

    /// Cancel the action currently running. Returns false when idle.
    pub fn cancel_current(&self) -> bool {
        let guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(token) => {
                log::info!("Cancelling pending request");
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn status(&self) -> ActionStatus {
        self.status.lock().await.clone()
    }

    /// Non-blocking status read; `None` while the worker holds the lock.
    pub fn try_status(&self) -> Option<ActionStatus> {
        self.status.try_lock().ok().map(|status| status.clone())
    }
}

fn set_current(slot: &StdMutex<Option<CancelToken>>, token: Option<CancelToken>) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = token;
}

#[cfg(test)]
impl ActionManager {
    pub(crate) fn with_closed_channel_for_test() -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<ActionRequest>();
        drop(rx);
        Self {
            request_tx: tx,
            status: Arc::new(Mutex::new(ActionStatus::Idle)),
            current: Arc::new(StdMutex::new(None)),
        }
    }
}
