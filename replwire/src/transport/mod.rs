//! Transport layer for the shell's pseudo-terminal.
//!
//! This module owns the child process: spawning it on a PTY, moving bytes
//! in and out, and tearing it down. The driver talks to it only through the
//! [`Spawner`] and [`Transport`] traits so tests can substitute a scripted
//! child.

pub mod config;
mod pty;
#[cfg(test)]
pub(crate) mod scripted;
mod signal;

use std::future::Future;
use std::io;

pub use config::SpawnConfig;
pub use pty::{PtySpawner, PtyTransport};
pub use signal::DefaultInterruptGuard;

use crate::error::StartupError;

/// Byte the terminal line discipline turns into end-of-file (Ctrl-D).
pub const EOF_BYTE: u8 = 0x04;

/// Outcome of a non-blocking read.
#[derive(Debug, PartialEq, Eq)]
pub enum TryRecv {
    /// Output that had already arrived.
    Data(Vec<u8>),
    /// Nothing pending right now.
    Empty,
    /// The output stream has ended.
    Closed,
}

/// A live connection to the child's terminal.
pub trait Transport: Send {
    /// Write raw bytes to the child's input.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Wait for the next chunk of output. `None` means end-of-stream.
    fn recv(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Take output that has already arrived without waiting.
    fn try_recv(&mut self) -> TryRecv;

    /// Kill the child and release the terminal. Best effort.
    fn terminate(&mut self) -> impl Future<Output = ()> + Send;

    /// OS process id of the child, when known.
    fn process_id(&self) -> Option<u32>;
}

/// Factory for [`Transport`]s; invoked once per session generation.
pub trait Spawner: Send {
    /// The transport this spawner produces.
    type Transport: Transport;

    /// Launch the child described by `config`.
    fn spawn(&mut self, config: &SpawnConfig) -> Result<Self::Transport, StartupError>;
}
