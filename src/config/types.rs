//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where provider definitions are read from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProvidersConfig {
    /// Directory of `*.json` provider definitions (`~` is expanded)
    #[serde(default = "default_providers_directory")]
    pub directory: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            directory: default_providers_directory(),
        }
    }
}

/// HTTP request settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequestConfig {
    /// Per-request timeout in seconds (valid range: 1 - 600)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent product name; the version is appended automatically
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// External screenshot tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptureConfig {
    #[serde(default = "default_grim")]
    pub grim_command: String,

    #[serde(default = "default_slurp")]
    pub slurp_command: String,

    /// Used to find the focused window for window captures
    #[serde(default = "default_hyprctl")]
    pub hyprctl_command: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            grim_command: default_grim(),
            slurp_command: default_slurp(),
            hyprctl_command: default_hyprctl(),
        }
    }
}

/// Input dialog shown for `$input$` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PromptConfig {
    /// zenity-compatible dialog program
    #[serde(default = "default_prompt_command")]
    pub command: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            command: default_prompt_command(),
        }
    }
}

/// Desktop notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How long notifications stay visible in milliseconds (valid range: 500 - 60000)
    #[serde(default = "default_notification_timeout")]
    pub timeout_ms: i32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_notification_timeout(),
        }
    }
}

/// Append-only log of successful results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log file path (`~` is expanded)
    #[serde(default = "default_log_path")]
    pub path: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_log_path(),
        }
    }
}

/// Daemon behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DaemonConfig {
    /// Provider run when the daemon receives SIGUSR1 (e.g. from a compositor keybinding)
    #[serde(default)]
    pub hotkey_provider: Option<String>,

    /// Capture mode for the hotkey when the provider is an uploader: "full", "region" or "window"
    #[serde(default)]
    pub hotkey_capture: Option<String>,
}

fn default_providers_directory() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("wayshare")
        .join("providers")
        .to_string_lossy()
        .into_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "wayshare".to_string()
}

fn default_grim() -> String {
    "grim".to_string()
}

fn default_slurp() -> String {
    "slurp".to_string()
}

fn default_hyprctl() -> String {
    "hyprctl".to_string()
}

fn default_prompt_command() -> String {
    "zenity".to_string()
}

fn default_true() -> bool {
    true
}

fn default_notification_timeout() -> i32 {
    3000
}

fn default_log_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("wayshare")
        .join("upload.txt")
        .to_string_lossy()
        .into_owned()
}
