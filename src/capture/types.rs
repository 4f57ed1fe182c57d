//! Data types for screenshot capture.

use thiserror::Error;

/// Which part of the screen an upload provider receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CaptureMode {
    /// Every output.
    Full,
    /// A rectangle selected with the pointer.
    Region,
    /// The focused window.
    Window,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 3] = [CaptureMode::Full, CaptureMode::Region, CaptureMode::Window];

    /// Title of the tray submenu listing upload providers for this mode.
    pub fn menu_label(self) -> &'static str {
        match self {
            CaptureMode::Full => "Full Screenshot",
            CaptureMode::Region => "Region Screenshot",
            CaptureMode::Window => "Window Screenshot",
        }
    }
}

/// Errors that can occur during screenshot capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    #[error("{0} returned an empty screenshot")]
    EmptyImage(String),

    #[error("Unexpected capture tool output: {0}")]
    InvalidResponse(String),

    #[error("Capture task failed: {0}")]
    Join(String),
}
