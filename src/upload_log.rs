//! Append-only log of successful results.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use fs2::FileExt;

/// Appends `[<date> <time>] <result>` lines to a text file.
#[derive(Debug, Clone)]
pub struct UploadLog {
    path: PathBuf,
}

impl UploadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, result: &str) -> Result<()> {
        self.append_at(result, Local::now())
    }

    fn append_at(&self, result: &str, when: DateTime<Local>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create log directory {}", parent.display())
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open upload log {}", self.path.display()))?;

        // The daemon and one-shot runs may append at the same time.
        file.lock_exclusive()
            .with_context(|| format!("failed to lock upload log {}", self.path.display()))?;
        let written = writeln!(file, "{}", format_entry(result, when))
            .with_context(|| format!("failed to write upload log {}", self.path.display()));
        file.unlock().unwrap_or_else(|err| {
            log::warn!(
                "failed to unlock upload log {}: {}",
                self.path.display(),
                err
            )
        });
        written
    }
}

/// `[Monday, October 19, 2026 14:03:22] https://...`
pub fn format_entry(result: &str, when: DateTime<Local>) -> String {
    format!(
        "[{} {}] {}",
        when.format("%A, %B %-d, %Y"),
        when.format("%H:%M:%S"),
        result
    )
}
