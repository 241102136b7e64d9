//! # Replwire
//!
//! Async driver for interactive command-line shells that only speak through
//! a terminal, such as the legacy MongoDB `mongo` shell.
//!
//! Replwire spawns the shell on a pseudo-terminal with a unique random
//! prompt, sends it one command at a time and detects the end of each
//! response by waiting for that prompt.
//!
//! ## Features
//!
//! - PTY sessions via portable-pty, read on a dedicated thread
//! - Primary vs continuation prompt detection over a windowed byte buffer
//! - Drain loop for prompts repainted by the shell's line editor
//! - Redraw-collapsing response filter
//! - Automatic restart on end-of-stream, incomplete input or interrupt
//! - Shell profiles for shell-specific launch and prompt details
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use replwire::{Driver, DriverBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), replwire::Error> {
//!     let mut driver = DriverBuilder::new().build()?;
//!
//!     driver.open().await?;
//!
//!     let response = driver.execute("db.test.count()").await?;
//!     println!("{}", response.result);
//!
//!     driver.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod profile;
pub mod transport;

// Re-export main types for convenience
pub use channel::{InterruptHandle, PromptMatch, ResponseFilter};
pub use driver::{
    Driver, DriverBuilder, LogObserver, NoopObserver, Response, SessionDriver, SessionEvent,
    SessionObserver, SessionState,
};
pub use error::{Error, ErrorKind};
pub use profile::{LaunchOptions, ShellProfile};
pub use transport::SpawnConfig;
