//! Shell profiles.
//!
//! A profile holds everything that differs between interactive shells:
//! how to launch them, what their prompts look like and how to clean their
//! output. The driver is shell-agnostic.

mod definition;
pub mod mongo;
mod options;
mod version;

pub use definition::ShellProfile;
pub use options::{CONFIG_DIR_ENV, DEFAULT_CONFIG_DIR, LaunchOptions};
pub use version::{ShellVersion, parse_version, probe_version};
