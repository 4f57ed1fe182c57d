//! Configuration file support for wayshare.
//!
//! Settings are loaded from `~/.config/wayshare/config.toml`. They cover where
//! provider definitions live, request timeouts, the external capture and prompt
//! tools, notifications and the upload log.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod types;

pub use types::{
    CaptureConfig, DaemonConfig, LogConfig, NotificationConfig, PromptConfig, ProvidersConfig,
    RequestConfig,
};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::CaptureMode;

/// Root configuration, deserialized from TOML.
///
/// # Example TOML
/// ```toml
/// [providers]
/// directory = "~/.config/wayshare/providers"
///
/// [request]
/// timeout_secs = 30
///
/// [notifications]
/// enabled = true
/// timeout_ms = 3000
///
/// [log]
/// path = "~/.local/share/wayshare/upload.txt"
///
/// [daemon]
/// hotkey_provider = "Imgur"
/// hotkey_capture = "region"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Config {
    /// Clamps numeric settings to their valid ranges and logs a warning for
    /// each value that had to change.
    ///
    /// - `request.timeout_secs`: 1 - 600
    /// - `notifications.timeout_ms`: 500 - 60000
    /// - `daemon.hotkey_capture`: full, region or window
    fn validate_and_clamp(&mut self) {
        if !(1..=600).contains(&self.request.timeout_secs) {
            log::warn!(
                "Invalid request timeout_secs {}, clamping to 1-600 range",
                self.request.timeout_secs
            );
            self.request.timeout_secs = self.request.timeout_secs.clamp(1, 600);
        }

        if !(500..=60_000).contains(&self.notifications.timeout_ms) {
            log::warn!(
                "Invalid notification timeout_ms {}, clamping to 500-60000 range",
                self.notifications.timeout_ms
            );
            self.notifications.timeout_ms = self.notifications.timeout_ms.clamp(500, 60_000);
        }

        if let Some(mode) = &self.daemon.hotkey_capture
            && parse_capture_mode(mode).is_none()
        {
            log::warn!(
                "Invalid daemon hotkey_capture '{}', falling back to 'full'",
                mode
            );
            self.daemon.hotkey_capture = Some("full".to_string());
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("wayshare");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default path, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Loads configuration from `config_path`, or returns defaults if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not valid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn providers_dir(&self) -> PathBuf {
        expand_tilde(&self.providers.directory)
    }

    pub fn log_path(&self) -> PathBuf {
        expand_tilde(&self.log.path)
    }

    /// Capture mode used by the SIGUSR1 hotkey.
    pub fn hotkey_capture_mode(&self) -> CaptureMode {
        self.daemon
            .hotkey_capture
            .as_deref()
            .and_then(parse_capture_mode)
            .unwrap_or(CaptureMode::Full)
    }

    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

fn parse_capture_mode(value: &str) -> Option<CaptureMode> {
    match value.to_ascii_lowercase().as_str() {
        "full" => Some(CaptureMode::Full),
        "region" => Some(CaptureMode::Region),
        "window" => Some(CaptureMode::Window),
        _ => None,
    }
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config.request.timeout_secs, 30);
        assert!(config.notifications.enabled);
        assert!(config.providers.directory.ends_with("providers"));
        assert_eq!(config.hotkey_capture_mode(), CaptureMode::Full);
    }

    #[test]
    fn values_are_clamped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[request]
timeout_secs = 0

[notifications]
timeout_ms = 100

[daemon]
hotkey_provider = "Imgur"
hotkey_capture = "sideways"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.request.timeout_secs, 1);
        assert_eq!(config.notifications.timeout_ms, 500);
        assert_eq!(config.daemon.hotkey_provider.as_deref(), Some("Imgur"));
        assert_eq!(config.hotkey_capture_mode(), CaptureMode::Full);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[capture]\ngrim_command = \"/opt/grim\"\n[daemon]\nhotkey_capture = \"Region\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.capture.grim_command, "/opt/grim");
        assert_eq!(config.capture.slurp_command, "slurp");
        assert_eq!(config.hotkey_capture_mode(), CaptureMode::Region);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[request\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/providers");
        assert!(!expanded.to_string_lossy().starts_with("~"));

        let no_tilde = expand_tilde("/absolute/path");
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));
    }
}
