use std::sync::Arc;

use tokio::task;

use crate::action::{
    dependencies::ActionDependencies,
    types::{ActionError, ActionOutcome, ActionTrigger},
};
use crate::dispatch::{self, CancelToken, DispatchError};
use crate::provider::{OrderedMap, Provider, placeholder};
use crate::template;

/// Runs one provider action end to end.
///
/// Capture (uploads only), placeholder resolution, dispatch and extraction
/// happen in that order. Clipboard, log and the success notification only
/// fire once a result has been extracted; any earlier failure notifies the
/// user and returns without touching them.
pub async fn perform_action(
    provider: Arc<Provider>,
    trigger: ActionTrigger,
    dependencies: Arc<ActionDependencies>,
    cancel: CancelToken,
) -> Result<ActionOutcome, ActionError> {
    log::info!("Starting action '{}' ({:?})", provider.name, trigger);

    // Step 1: Screenshot for upload providers
    let payload = match (trigger, provider.is_upload()) {
        (ActionTrigger::Capture(mode), true) => {
            match dependencies.screenshots.capture(mode).await {
                Ok(data) => Some(data),
                Err(err) => {
                    log::error!("Screenshot capture failed: {}", err);
                    dependencies
                        .notifier
                        .notify("Error", "There was an error taking a screenshot")
                        .await;
                    return Err(err.into());
                }
            }
        }
        (ActionTrigger::Tool, false) => None,
        _ => {
            return Err(ActionError::WrongTrigger {
                provider: provider.name.clone(),
                trigger,
            });
        }
    };

    // Step 2: Placeholders (may block on an input dialog)
    let (arguments, headers) =
        resolve_placeholders(Arc::clone(&provider), Arc::clone(&dependencies)).await?;

    // Step 3: Request
    let body = match dispatch::dispatch(
        dependencies.transport.as_ref(),
        &provider,
        &arguments,
        &headers,
        payload.as_deref(),
        &cancel,
    )
    .await
    {
        Ok(body) => body,
        Err(DispatchError::Cancelled) => return Err(DispatchError::Cancelled.into()),
        Err(err) => {
            log::error!("Request for '{}' failed: {}", provider.name, err);
            let message = if payload.is_some() {
                "There was an error uploading your screenshot".to_string()
            } else {
                format!("Request to {} failed", provider.name)
            };
            dependencies.notifier.notify("Error", &message).await;
            return Err(err.into());
        }
    };
    log::debug!("Response from '{}': {}", provider.name, body);

    // Step 4: Result extraction
    let result = match template::extract_result(&provider, &body) {
        Ok(result) => result,
        Err(err) => {
            log::error!("Extraction for '{}' failed: {}", provider.name, err);
            dependencies
                .notifier
                .notify(
                    "Error",
                    &format!("Could not extract a result from {}", provider.name),
                )
                .await;
            return Err(err.into());
        }
    };

    // Step 5: Hand the result to the user
    deliver(result.clone(), Arc::clone(&dependencies)).await;
    dependencies
        .notifier
        .notify(&format!("Response from {}", provider.name), &result)
        .await;

    log::info!("Action '{}' finished: {}", provider.name, result);
    Ok(ActionOutcome { provider, result })
}

async fn resolve_placeholders(
    provider: Arc<Provider>,
    dependencies: Arc<ActionDependencies>,
) -> Result<(OrderedMap, OrderedMap), ActionError> {
    task::spawn_blocking(move || {
        let seed = || dependencies.clipboard.get_text().unwrap_or_default();
        placeholder::resolve_request(&provider, dependencies.prompt.as_ref(), &seed)
    })
    .await
    .map_err(|e| ActionError::Join(format!("Placeholder task failed: {}", e)))
}

/// Clipboard and log failures are reported but do not fail the action.
async fn deliver(result: String, dependencies: Arc<ActionDependencies>) {
    let outcome = task::spawn_blocking(move || {
        match dependencies.clipboard.set_text(&result) {
            Ok(()) => log::info!("Copied result to clipboard"),
            Err(e) => log::warn!("Failed to copy result to clipboard: {}", e),
        }
        if let Err(e) = dependencies.log.append(&result) {
            log::warn!("Failed to append to upload log: {:#}", e);
        }
    })
    .await;

    if let Err(e) = outcome {
        log::warn!("Result delivery task failed: {}", e);
    }
}
