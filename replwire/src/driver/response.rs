//! Response type for command execution results.

use std::time::Duration;

use serde::Serialize;

/// Response from a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// The normalized command that was sent.
    pub command: String,

    /// The filtered output.
    pub result: String,

    /// Everything captured before the prompts, before filtering.
    pub raw_result: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Number of blank lines sent to flush prompt redraws.
    pub drain_rounds: usize,
}

impl Response {
    /// Create a new response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        elapsed: Duration,
        drain_rounds: usize,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            elapsed,
            drain_rounds,
        }
    }

    /// Response to a command that normalized to nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the shell printed nothing.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
