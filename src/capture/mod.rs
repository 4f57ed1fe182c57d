//! Screenshot capture for upload providers.
//!
//! Images are produced by `grim` as PNG bytes:
//! - Full screen capture
//! - Region capture (`slurp` selection)
//! - Active window capture (Hyprland geometry via `hyprctl`)

pub mod types;

mod sources;

pub use sources::capture_image;
pub use types::{CaptureError, CaptureMode};
