//! Wayland clipboard access for results and prompt seeding.

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use thiserror::Error;
use wl_clipboard_rs::copy::{MimeType, Options, Source};

#[derive(Debug, Error)]
#[error("Clipboard operation failed: {0}")]
pub struct ClipboardError(pub String);

/// Copy text to the Wayland clipboard.
///
/// Prefers the `wl-copy` command (it forks and keeps serving the selection),
/// falling back to wl-clipboard-rs if the command is unavailable.
pub fn set_text(text: &str) -> Result<(), ClipboardError> {
    match copy_via_command(text) {
        Ok(()) => {
            log::debug!("Copied {} bytes to clipboard via wl-copy", text.len());
            Ok(())
        }
        Err(cmd_err) => {
            log::warn!(
                "wl-copy command path failed ({}). Falling back to wl-clipboard-rs",
                cmd_err
            );
            copy_via_library(text).map_err(|lib_err| {
                ClipboardError(format!(
                    "wl-copy failed: {} ; wl-clipboard-rs failed: {}",
                    cmd_err, lib_err
                ))
            })
        }
    }
}

/// Current clipboard text, if any. Used to pre-fill input prompts.
pub fn get_text() -> Option<String> {
    match paste_via_library() {
        Ok(text) => Some(text),
        Err(lib_err) => {
            log::debug!("wl-clipboard-rs paste failed ({}), trying wl-paste", lib_err);
            paste_via_command()
                .map_err(|cmd_err| log::debug!("wl-paste failed: {}", cmd_err))
                .ok()
        }
    }
}

fn copy_via_library(text: &str) -> Result<(), ClipboardError> {
    Options::new()
        .copy(Source::Bytes(text.as_bytes().into()), MimeType::Text)
        .map_err(|e| ClipboardError(format!("wl-clipboard-rs error: {}", e)))
}

fn copy_via_command(text: &str) -> Result<(), ClipboardError> {
    let mut child = Command::new("wl-copy")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ClipboardError(format!("Failed to spawn wl-copy (is it installed?): {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| ClipboardError(format!("Failed to write to wl-copy stdin: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| ClipboardError(format!("Failed to wait for wl-copy: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClipboardError(format!("wl-copy failed: {}", stderr.trim())));
    }
    Ok(())
}

fn paste_via_library() -> Result<String, ClipboardError> {
    use wl_clipboard_rs::paste::{ClipboardType, MimeType, Seat, get_contents};

    let (mut pipe, _mime) = get_contents(ClipboardType::Regular, Seat::Unspecified, MimeType::Text)
        .map_err(|e| ClipboardError(format!("wl-clipboard-rs error: {}", e)))?;
    let mut contents = Vec::new();
    pipe.read_to_end(&mut contents)
        .map_err(|e| ClipboardError(format!("Failed to read clipboard pipe: {}", e)))?;
    Ok(String::from_utf8_lossy(&contents).into_owned())
}

fn paste_via_command() -> Result<String, ClipboardError> {
    let output = Command::new("wl-paste")
        .args(["--no-newline", "--type", "text"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| ClipboardError(format!("Failed to run wl-paste: {}", e)))?;
    if !output.status.success() {
        return Err(ClipboardError("wl-paste exited with an error".into()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
