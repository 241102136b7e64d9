//! Session lifecycle events and the observers that receive them.

use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::channel::PromptMatch;
use crate::error::ErrorKind;

/// A transition in the life of a session or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A child process was launched.
    Spawned { generation: u64 },
    /// The child printed its first prompt.
    Ready { generation: u64, elapsed: Duration },
    /// A normalized command was written.
    CommandSent { command: String },
    /// A wait for the prompt finished.
    PromptMatched { outcome: PromptMatch },
    /// A blank line was sent to flush redraw output.
    DrainRound { round: usize },
    /// The session is being replaced.
    Restarting { reason: ErrorKind },
    /// A replacement session is ready.
    Restarted { generation: u64 },
    /// The replacement session could not be started.
    RestartFailed { message: String },
    /// The session was shut down by the caller.
    Shutdown,
}

/// Receives [`SessionEvent`]s from a driver.
///
/// Passed to the driver at construction. The default implementation ignores
/// every event.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent) {
        let _ = event;
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Spawned { generation } => debug!("Spawned shell session {}", generation),
            SessionEvent::Ready {
                generation,
                elapsed,
            } => info!("Shell session {} ready in {:?}", generation, elapsed),
            SessionEvent::CommandSent { command } => debug!("Sent command: {}", command),
            SessionEvent::PromptMatched { outcome } => trace!("Prompt wait ended: {:?}", outcome),
            SessionEvent::DrainRound { round } => trace!("Drain round {}", round),
            SessionEvent::Restarting { reason } => warn!("Restarting shell session ({})", reason),
            SessionEvent::Restarted { generation } => info!("Restarted as session {}", generation),
            SessionEvent::RestartFailed { message } => warn!("Restart failed: {}", message),
            SessionEvent::Shutdown => info!("Shell session shut down"),
        }
    }
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
