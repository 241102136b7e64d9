//! Command normalization.

use crate::error::{Error, Result};
use crate::profile::ShellProfile;

/// Collapse a multi-line cell into one logical line.
///
/// Blank lines and lines starting with `comment_marker` (after indentation)
/// are dropped; the rest are joined with every whitespace run reduced to a
/// single space. The shell's line editor mangles indentation and long
/// physical lines, so everything is sent as one line.
pub fn normalize(command: &str, comment_marker: &str) -> String {
    command
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty())
        .filter(|line| comment_marker.is_empty() || !line.starts_with(comment_marker))
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A normalized command ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
}

impl Command {
    /// Normalize `raw` for `profile` and check it against the length limit.
    pub fn prepare(raw: &str, profile: &ShellProfile) -> Result<Self> {
        let text = normalize(raw, &profile.comment_marker);
        let length = text.chars().count();
        if length > profile.max_command_length {
            return Err(Error::CommandTooLong {
                length,
                limit: profile.max_command_length,
            });
        }
        Ok(Self { text })
    }

    /// The normalized text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether nothing is left to send.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Bytes written to the shell: the text and a line break.
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.text.len() + 1);
        line.extend_from_slice(self.text.as_bytes());
        line.push(b'\n');
        line
    }
}
