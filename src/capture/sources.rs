use std::process::{Command, Stdio};

use serde_json::Value;
use tokio::task;

use crate::capture::types::{CaptureError, CaptureMode};
use crate::config::CaptureConfig;

/// Capture a screenshot with `grim`, using `slurp` for region selection and
/// `hyprctl` for the focused window geometry.
pub async fn capture_image(mode: CaptureMode, tools: CaptureConfig) -> Result<Vec<u8>, CaptureError> {
    task::spawn_blocking(move || -> Result<Vec<u8>, CaptureError> {
        let geometry = match mode {
            CaptureMode::Full => None,
            CaptureMode::Region => Some(select_region(&tools.slurp_command)?),
            CaptureMode::Window => Some(active_window_geometry(&tools.hyprctl_command)?),
        };
        grim(&tools.grim_command, geometry.as_deref())
    })
    .await
    .map_err(|e| CaptureError::Join(e.to_string()))?
}

fn grim(command: &str, geometry: Option<&str>) -> Result<Vec<u8>, CaptureError> {
    let mut args = Vec::new();
    if let Some(geometry) = geometry {
        log::debug!("Capturing {} via {}", geometry, command);
        args.extend(["-g", geometry]);
    }
    args.push("-");

    let png = run_tool(command, &args)?;
    if png.is_empty() {
        return Err(CaptureError::EmptyImage(command.to_string()));
    }
    log::info!("Captured screenshot ({} bytes)", png.len());
    Ok(png)
}

/// `slurp` prints "x,y wxh"; it exits non-zero when the selection is cancelled.
fn select_region(command: &str) -> Result<String, CaptureError> {
    let output = run_tool(command, &["-f", "%x,%y %wx%h"])?;
    let geometry = String::from_utf8(output)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid {command} output: {e}")))?;
    let geometry = geometry.trim();
    if geometry.is_empty() {
        return Err(CaptureError::InvalidResponse(format!(
            "{command} returned empty geometry"
        )));
    }
    Ok(geometry.to_string())
}

fn active_window_geometry(command: &str) -> Result<String, CaptureError> {
    let output = run_tool(command, &["activewindow", "-j"])?;
    let window: Value = serde_json::from_slice(&output).map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse {command} output: {e}"))
    })?;
    let geometry = window_geometry(&window)?;

    let scale = monitor_scale(command, &window).unwrap_or_else(|err| {
        log::warn!("Could not read monitor scale, assuming 1.0: {}", err);
        1.0
    });
    Ok(geometry.scaled(scale).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Geometry {
    fn scaled(self, scale: f64) -> Self {
        if (scale - 1.0).abs() <= f64::EPSILON {
            return self;
        }
        Self {
            x: self.x * scale,
            y: self.y * scale,
            width: self.width * scale,
            height: self.height * scale,
        }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{} {}x{}",
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as u32,
            self.height.round() as u32
        )
    }
}

fn window_geometry(window: &Value) -> Result<Geometry, CaptureError> {
    let pair = |key: &str| -> Result<(f64, f64), CaptureError> {
        let values = window
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| CaptureError::InvalidResponse(format!("Missing '{key}' for active window")))?;
        match (
            values.first().and_then(Value::as_f64),
            values.get(1).and_then(Value::as_f64),
        ) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(CaptureError::InvalidResponse(format!(
                "Invalid '{key}' for active window"
            ))),
        }
    };

    let (x, y) = pair("at")?;
    let (width, height) = pair("size")?;
    if width <= 0.0 || height <= 0.0 {
        return Err(CaptureError::InvalidResponse(
            "Active window has non-positive dimensions".into(),
        ));
    }
    Ok(Geometry {
        x,
        y,
        width,
        height,
    })
}

fn monitor_scale(command: &str, window: &Value) -> Result<f64, CaptureError> {
    let Some(monitor_id) = window.get("monitor").and_then(Value::as_i64) else {
        return Ok(1.0);
    };

    let output = run_tool(command, &["monitors", "-j"])?;
    let monitors: Value = serde_json::from_slice(&output).map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse {command} monitors: {e}"))
    })?;

    Ok(monitors
        .as_array()
        .into_iter()
        .flatten()
        .find(|monitor| monitor.get("id").and_then(Value::as_i64) == Some(monitor_id))
        .and_then(|monitor| monitor.get("scale").and_then(Value::as_f64))
        .unwrap_or(1.0))
}

fn run_tool(command: &str, args: &[&str]) -> Result<Vec<u8>, CaptureError> {
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| CaptureError::Spawn {
            tool: command.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::ToolFailed {
            tool: command.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(output.stdout)
}
