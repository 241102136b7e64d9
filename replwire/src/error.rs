//! Error types for replwire.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for replwire operations.
///
/// Every failure of a request/response cycle maps to exactly one variant.
/// Use [`Error::kind`] to branch on the failure without matching on payloads,
/// and [`Error::restarts_session`] to learn whether the driver already
/// replaced the child before returning.
#[derive(Error, Debug)]
pub enum Error {
    /// The normalized command is longer than the shell's line limit.
    /// Nothing was written to the child.
    #[error(
        "Command too long: {length} effective characters (limit {limit}). \
         Indentation does not count towards effective characters."
    )]
    CommandTooLong { length: usize, limit: usize },

    /// The shell answered with its continuation prompt.
    #[error("Incomplete input: the shell is waiting for more lines after '{command}'")]
    IncompleteInput { command: String },

    /// No prompt arrived before the deadline. The session is left running.
    #[error("No prompt within {0:?}")]
    Timeout(Duration),

    /// The child's output stream closed.
    #[error("Shell session terminated")]
    SessionTerminated,

    /// The request was cancelled by the caller.
    #[error("Interrupted")]
    Interrupted,

    /// The shell could not be started.
    #[error("Startup failed: {0}")]
    StartupFailed(#[from] StartupError),

    /// Writing to the child's input failed.
    #[error("Failed to transmit command: {0}")]
    TransmitFailed(#[source] io::Error),

    /// Invalid driver or profile configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Discriminant of [`Error`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CommandTooLong,
    IncompleteInput,
    Timeout,
    SessionTerminated,
    Interrupted,
    StartupFailed,
    TransmitFailed,
    Config,
}

impl Error {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CommandTooLong { .. } => ErrorKind::CommandTooLong,
            Error::IncompleteInput { .. } => ErrorKind::IncompleteInput,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::SessionTerminated => ErrorKind::SessionTerminated,
            Error::Interrupted => ErrorKind::Interrupted,
            Error::StartupFailed(_) => ErrorKind::StartupFailed,
            Error::TransmitFailed(_) => ErrorKind::TransmitFailed,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the driver restarts the shell when this error occurs.
    pub fn restarts_session(&self) -> bool {
        self.kind().restarts_session()
    }
}

impl ErrorKind {
    /// Whether errors of this kind force a full session restart.
    pub fn restarts_session(self) -> bool {
        matches!(
            self,
            ErrorKind::IncompleteInput
                | ErrorKind::SessionTerminated
                | ErrorKind::TransmitFailed
                | ErrorKind::Interrupted
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::CommandTooLong => "command too long",
            ErrorKind::IncompleteInput => "incomplete input",
            ErrorKind::Timeout => "timeout",
            ErrorKind::SessionTerminated => "session terminated",
            ErrorKind::Interrupted => "interrupted",
            ErrorKind::StartupFailed => "startup failed",
            ErrorKind::TransmitFailed => "transmit failed",
            ErrorKind::Config => "configuration",
        };
        f.write_str(name)
    }
}

/// Errors raised while spawning the shell and waiting for its first prompt.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The executable could not be launched.
    #[error("Failed to spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    /// Pseudo-terminal allocation or handle setup failed.
    #[error("PTY error: {0}")]
    Pty(String),

    /// The child closed its output before printing a prompt.
    #[error("Shell exited before its first prompt")]
    ExitedEarly,

    /// The child stayed silent past the startup deadline.
    #[error("No prompt from shell within {0:?}")]
    NoPrompt(Duration),

    /// Installing or restoring the interrupt handler failed.
    #[error("Signal handling error: {0}")]
    Signal(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The options file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The options file is not a YAML mapping.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A launch option cannot be expressed as a command-line flag.
    #[error("Invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    /// The search overlap is too small to find a prompt split across reads.
    #[error("Search depth {depth} is shorter than the {minimum}-byte prompt")]
    SearchDepth { depth: usize, minimum: usize },

    /// A prompt or filter pattern failed to compile.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using replwire's Error.
pub type Result<T> = std::result::Result<T, Error>;
