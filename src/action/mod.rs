//! Provider actions: the pipeline behind every menu entry.
//!
//! An action captures a screenshot (upload providers only), resolves request
//! placeholders, dispatches the request, extracts the result and hands it to
//! the clipboard, the upload log and a notification. Effectful steps go
//! through the collaborator traits in [`dependencies`] so the sequence can be
//! tested with stubs.

pub mod dependencies;
pub mod types;

mod manager;
mod runner;

pub use dependencies::{ActionDependencies, Clipboard, Notifier, ResultLog, ScreenshotSource};
pub use manager::ActionManager;
pub use runner::perform_action;
pub use types::{ActionError, ActionOutcome, ActionStatus, ActionTrigger};
