//! Modal text input via a zenity-compatible dialog.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::provider::InputPrompt;

/// Shows `zenity --entry` for single-line input. Multi-line input uses a
/// `--forms` multi-line field, or an editable `--text-info` box when there is
/// seed text to prefill (forms cannot prefill).
pub struct DialogPrompt {
    command: String,
}

impl DialogPrompt {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn build_args(label: &str, seed: &str, multiline: bool) -> Vec<String> {
        if multiline && seed.is_empty() {
            vec![
                "--forms".into(),
                "--title".into(),
                "Wayshare".into(),
                "--text".into(),
                label.into(),
                "--add-multiline-entry".into(),
                label.into(),
            ]
        } else if multiline {
            vec![
                "--text-info".into(),
                "--editable".into(),
                "--title".into(),
                label.into(),
                "--width".into(),
                "400".into(),
                "--height".into(),
                "200".into(),
            ]
        } else {
            vec![
                "--entry".into(),
                "--title".into(),
                "Wayshare".into(),
                "--text".into(),
                label.into(),
                "--entry-text".into(),
                seed.into(),
            ]
        }
    }
}

impl InputPrompt for DialogPrompt {
    fn prompt(&self, label: &str, seed: &str, multiline: bool) -> Option<String> {
        let mut child = match Command::new(&self.command)
            .args(Self::build_args(label, seed, multiline))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                log::error!("Failed to launch input dialog '{}': {}", self.command, err);
                return None;
            }
        };

        // The multi-line dialog reads its initial text from stdin.
        if let Some(mut stdin) = child.stdin.take()
            && multiline
            && let Err(err) = stdin.write_all(seed.as_bytes())
        {
            log::warn!("Failed to seed input dialog: {}", err);
        }

        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(err) => {
                log::error!("Input dialog '{}' failed: {}", self.command, err);
                return None;
            }
        };

        if !output.status.success() {
            log::debug!("Input dialog dismissed ({})", output.status);
            return None;
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.ends_with('\n') {
            text.pop();
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_args_carry_label_and_seed() {
        let args = DialogPrompt::build_args("Title is required by Paste", "clip", false);
        assert_eq!(args[0], "--entry");
        assert!(args.windows(2).any(|w| w[0] == "--text" && w[1] == "Title is required by Paste"));
        assert!(args.windows(2).any(|w| w[0] == "--entry-text" && w[1] == "clip"));
    }

    #[test]
    fn multiline_args_show_label_as_text_without_seed() {
        let args = DialogPrompt::build_args("Content is required by Paste", "", true);
        assert_eq!(args[0], "--forms");
        assert!(args.windows(2).any(|w| w[0] == "--title" && w[1] == "Wayshare"));
        assert!(args.windows(2).any(|w| w[0] == "--text" && w[1] == "Content is required by Paste"));
        assert!(args.iter().any(|a| a == "--add-multiline-entry"));
    }

    #[test]
    fn multiline_args_with_seed_use_editable_text_box_titled_with_label() {
        let args = DialogPrompt::build_args("Content is required by Paste", "clip", true);
        assert_eq!(args[0], "--text-info");
        assert!(args.iter().any(|a| a == "--editable"));
        assert!(args.windows(2).any(|w| w[0] == "--title" && w[1] == "Content is required by Paste"));
    }

    #[test]
    fn successful_dialog_output_is_returned_without_trailing_newline() {
        // `echo` stands in for the dialog: it prints its arguments and exits 0.
        let prompt = DialogPrompt::new("echo");
        let answer = prompt.prompt("label", "seed", false).unwrap();
        assert!(answer.ends_with("seed"));
        assert!(!answer.ends_with('\n'));
    }

    #[test]
    fn failing_dialog_counts_as_cancel() {
        assert_eq!(DialogPrompt::new("false").prompt("label", "", false), None);
        assert_eq!(
            DialogPrompt::new("wayshare-missing-dialog").prompt("label", "", true),
            None
        );
    }
}
