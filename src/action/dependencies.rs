use std::sync::Arc;

use async_trait::async_trait;

use crate::capture::{self, CaptureError, CaptureMode};
use crate::clipboard::{self, ClipboardError};
use crate::config::{CaptureConfig, Config, NotificationConfig};
use crate::dispatch::{DispatchError, HttpTransport, Transport};
use crate::notification;
use crate::prompt::DialogPrompt;
use crate::provider::InputPrompt;
use crate::upload_log::UploadLog;

/// Abstraction over how screenshots are obtained.
#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    async fn capture(&self, mode: CaptureMode) -> Result<Vec<u8>, CaptureError>;
}

/// Abstraction over clipboard access.
pub trait Clipboard: Send + Sync {
    fn get_text(&self) -> Option<String>;
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Abstraction over user-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str);
}

/// Abstraction over the log of successful results.
pub trait ResultLog: Send + Sync {
    fn append(&self, result: &str) -> anyhow::Result<()>;
}

/// Bundle of collaborators used by the action pipeline. Each one can be mocked in tests.
#[derive(Clone)]
pub struct ActionDependencies {
    pub screenshots: Arc<dyn ScreenshotSource>,
    pub prompt: Arc<dyn InputPrompt>,
    pub clipboard: Arc<dyn Clipboard>,
    pub notifier: Arc<dyn Notifier>,
    pub log: Arc<dyn ResultLog>,
    pub transport: Arc<dyn Transport>,
}

impl ActionDependencies {
    /// Production collaborators configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self, DispatchError> {
        let log: Arc<dyn ResultLog> = if config.log.enabled {
            Arc::new(UploadLog::new(config.log_path()))
        } else {
            Arc::new(DisabledLog)
        };

        Ok(Self {
            screenshots: Arc::new(GrimScreenshots(config.capture.clone())),
            prompt: Arc::new(DialogPrompt::new(config.prompt.command.clone())),
            clipboard: Arc::new(WaylandClipboard),
            notifier: Arc::new(DesktopNotifier(config.notifications.clone())),
            log,
            transport: Arc::new(HttpTransport::new(&config.request)?),
        })
    }
}

struct GrimScreenshots(CaptureConfig);
struct WaylandClipboard;
struct DesktopNotifier(NotificationConfig);
struct DisabledLog;

#[async_trait]
impl ScreenshotSource for GrimScreenshots {
    async fn capture(&self, mode: CaptureMode) -> Result<Vec<u8>, CaptureError> {
        capture::capture_image(mode, self.0.clone()).await
    }
}

impl Clipboard for WaylandClipboard {
    fn get_text(&self) -> Option<String> {
        clipboard::get_text()
    }

    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        clipboard::set_text(text)
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) {
        if !self.0.enabled {
            return;
        }
        if let Err(e) = notification::send_notification(
            title,
            message,
            notification::icon_for(title),
            self.0.timeout_ms,
        )
        .await
        {
            log::warn!("Failed to send notification: {}", e);
        }
    }
}

impl ResultLog for UploadLog {
    fn append(&self, result: &str) -> anyhow::Result<()> {
        UploadLog::append(self, result)
    }
}

impl ResultLog for DisabledLog {
    fn append(&self, _result: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
