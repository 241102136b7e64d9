//! High-level driver for shell interaction.
//!
//! The driver layer provides the main API: start a shell, send it one
//! command at a time and get back clean responses.

mod builder;
mod command;
mod observer;
mod response;
mod session;

pub use builder::DriverBuilder;
pub use command::{Command, normalize};
pub use observer::{LogObserver, NoopObserver, SessionEvent, SessionObserver};
pub use response::Response;
pub use session::{SessionDriver, SessionState};

use std::future::Future;

use crate::error::Result;

/// Trait for interactive shell drivers.
pub trait Driver: Send {
    /// Start the shell if it is not running.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Terminate the shell.
    fn shutdown(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the shell to become idle again.
    fn execute(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially, stopping at the first failure.
    fn execute_all(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.execute(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Check if a shell session is running.
    fn is_open(&self) -> bool;
}
